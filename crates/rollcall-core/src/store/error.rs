use rusqlite::ffi;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Invalid(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database lock poisoned")]
    Poisoned,
}

impl StoreError {
    /// Translate constraint violations into caller-facing errors.
    ///
    /// `unique` and `foreign_key` describe what the violation means for the
    /// statement that failed; anything else stays a database error.
    pub(crate) fn from_constraint(err: rusqlite::Error, unique: &str, foreign_key: &str) -> Self {
        if let rusqlite::Error::SqliteFailure(ref code, _) = err {
            match code.extended_code {
                ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                    return StoreError::Conflict(unique.to_string());
                }
                ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                    return StoreError::Invalid(foreign_key.to_string());
                }
                _ => {}
            }
        }
        StoreError::Database(err)
    }
}
