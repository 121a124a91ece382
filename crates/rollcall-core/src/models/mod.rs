//! Data models for roster entities.
//!
//! This module contains the data structures shared by the store, the
//! aggregator and the HTTP layer:
//!
//! - `Member`, `NewMember`: roster entries and their input shape
//! - `Sex`, `Track`: the two category vocabularies, each with one
//!   encode/decode boundary used on the wire and in the database
//! - `Attendance`, `AttendanceMark`, `AttendanceWithMember`: weekly records
//! - `DateRange`: inclusive, optionally open date window
//! - `User`: dashboard account

pub mod attendance;
pub mod member;
pub mod user;

pub use attendance::{Attendance, AttendanceMark, AttendanceWithMember, DateRange};
pub use member::{Member, NewMember, Sex, Track, ValidationError};
pub use user::User;
