//! Core library for rollcall: class attendance tracking.
//!
//! This crate holds everything that does not depend on the HTTP layer:
//!
//! - `models`: members, attendance records and their category vocabularies
//! - `calendar`: the term's class dates per track
//! - `stats`: the attendance aggregator and the missed-class ranking
//! - `store`: SQLite persistence for users, members and attendance
//! - `auth`: password hashing and bearer tokens
//! - `import`: roster parsing from PDFs, text and Gemini
//! - `export`: spreadsheet reports and the Google Sheets client
//! - `remote`: error mapping and retry shared by outbound HTTP clients
//! - `utils`: formatting helpers

pub mod auth;
pub mod calendar;
pub mod export;
pub mod import;
pub mod models;
pub mod remote;
pub mod stats;
pub mod store;
pub mod utils;

pub use calendar::TermCalendar;
pub use stats::{AttendanceStats, MissedRanking};
pub use store::{RosterStore, StoreError};
