use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors produced by the engine. Every one of them points at a caller bug or at an input
/// outside of what the calendar can represent, so none of them is recoverable mid-computation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Interval start {start} is after its end {end}")]
    InvalidInterval {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("Date is out of the representable range: {0}")]
    OutOfRange(String),

    #[error("Invalid preference: {0}")]
    InvalidPreference(String),
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;

pub(crate) fn out_of_range(what: impl std::fmt::Display) -> EngineError {
    EngineError::OutOfRange(what.to_string())
}
