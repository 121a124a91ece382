//! Utility functions for string formatting and report values.

pub mod format;

// Re-export commonly used functions at module level
pub use format::{blank_to_none, format_phone, format_report_date, percent, truncate_chars, yes_no};
