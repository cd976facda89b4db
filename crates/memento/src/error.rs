//! Crate-level error type.

use thiserror::Error;

use crate::config::ConfigError;
use crate::extract::ExtractionError;
use crate::sink::SinkError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum Error {
    /// The reminders store is unreachable or refused access. Aborts the run.
    #[error("access to reminders was denied: {0}")]
    AccessDenied(String),
    /// The model's answer was unusable for one reminder.
    #[error("extraction failed: {0}")]
    Extraction(#[from] ExtractionError),
    #[error("calendar not found: {0}")]
    CalendarNotFound(String),
    #[error("printer unavailable: {0}")]
    PrintTransport(#[from] SinkError),
    #[error("store error: {0}")]
    Store(StoreError),
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl Error {
    /// Whether the whole run must stop, regardless of failure policy.
    ///
    /// A missing marker calendar is fatal: every later reminder would be
    /// printed and then fail to move.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::AccessDenied(_) | Error::CalendarNotFound(_) | Error::Config(_)
        )
    }
}

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::AccessDenied(msg) => Error::AccessDenied(msg),
            StoreError::CalendarNotFound(name) => Error::CalendarNotFound(name),
            other => Error::Store(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
