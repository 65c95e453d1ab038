use std::time::Duration;
use thiserror::Error;

/// Why a solve request could not produce a response
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolveError {
    /// Assistant, thread, message or run creation failed
    #[error("Setup failed: {0}")]
    Setup(String),

    #[error("Run stream failed: {0}")]
    Stream(String),

    #[error("Run stream did not complete within {0:?}")]
    Timeout(Duration),
}

pub type SolveResult<T> = Result<T, SolveError>;

/// Failures talking to the assistant service
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("No API key configured for the assistant service")]
    MissingApiKey,

    #[error("Request failed with status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Invalid event data: {0}")]
    InvalidEvent(String),
}
