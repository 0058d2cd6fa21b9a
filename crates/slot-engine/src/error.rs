//! Error types for slot-engine operations.

use thiserror::Error;

use crate::source::SourceError;

#[derive(Error, Debug)]
pub enum EngineError {
    /// Prerequisite calendar data (roster, business hours) is missing.
    #[error("Calendar not configured: {0}")]
    UnconfiguredCalendar(String),

    #[error("Invalid time: {0}")]
    InvalidTime(String),

    #[error("Invalid service duration: {0}")]
    InvalidDuration(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Source(#[from] SourceError),
}

pub type Result<T> = std::result::Result<T, EngineError>;
