//! Attendance export to Google Sheets.
//!
//! - `report`: builds the header, rows and summary block of each report
//! - `sheets`: service-account OAuth and the Sheets v4 calls that write them

pub mod report;
pub mod sheets;

use thiserror::Error;

use crate::remote::RemoteError;

pub use report::{date_report, date_sheet_name, range_report, SheetReport};
pub use sheets::{ExportResult, SheetsClient, SheetsCredentials, DEFAULT_SHEET_NAME};

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Google Sheets credentials not found. Please configure GOOGLE_SERVICE_ACCOUNT_JSON or GOOGLE_CLIENT_EMAIL and GOOGLE_PRIVATE_KEY")]
    NotConfigured,

    #[error("Google credentials error: {0}")]
    Credentials(String),

    #[error("Invalid spreadsheet: {0}")]
    InvalidTarget(String),

    #[error(transparent)]
    Remote(#[from] RemoteError),
}
