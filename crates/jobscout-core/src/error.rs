use std::time::Duration;

use thiserror::Error;

/// Application-wide error types for jobscout.
#[derive(Error, Debug)]
pub enum AppError {
    /// Caller input failed validation (missing title, bad max_results, ...).
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Configuration is missing or malformed.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// No browser session could be created.
    #[error("Session unavailable: {0}")]
    SessionUnavailable(String),

    /// Page navigation, scrolling, or content read failed.
    #[error("Navigation error: {0}")]
    NavigationError(String),

    /// A CSS selector could not be parsed.
    #[error("Selector error: {0}")]
    SelectorError(String),

    /// A source did not finish within its time budget.
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// The session limiter was shut down while a job waited for a slot.
    #[error("Session limiter is closed")]
    LimiterClosed,

    /// HTTP request failed (plain fetch backend).
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Generic error.
    #[error("{0}")]
    Generic(String),
}

impl AppError {
    /// Returns true if this error means no session can be created at all.
    ///
    /// When every selected source fails this way the whole request fails,
    /// instead of degrading to an empty result.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AppError::SessionUnavailable(_) | AppError::LimiterClosed
        )
    }

    /// Returns true if the caller, not the service, is at fault.
    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::InvalidQuery(_))
    }
}
