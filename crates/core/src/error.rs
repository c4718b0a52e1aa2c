//! Request-visible error taxonomy.
//!
//! The analytics pipeline is lossy-tolerant: model and lexicon failures
//! degrade a single field of the response. Only the errors defined here
//! surface to the calling layer, classified for HTTP mapping.

use thiserror::Error;

/// Coarse classification of an error for the outer HTTP layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Caller mistake, not retryable (4xx).
    Client,
    /// Infrastructure failure, retryable (5xx).
    Server,
}

/// Errors that can surface from the analytics and prediction entry points.
#[derive(Debug, Error)]
pub enum AdvisorError {
    /// A date string could not be parsed as `YYYY-MM-DD`.
    #[error("malformed date: {0}")]
    InvalidDate(String),

    /// The requested sector does not exist in the article store.
    #[error("unknown sector: {0}")]
    UnknownSector(String),

    /// The queried week holds more articles than the pipeline accepts.
    #[error("week {week} has {count} articles, exceeding the cap of {cap}")]
    TooManyArticles {
        /// Week bucket label.
        week: String,
        /// Number of articles found.
        count: usize,
        /// Maximum accepted per week.
        cap: usize,
    },

    /// A backing store failed after one retry.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

impl AdvisorError {
    /// Returns the error class for HTTP mapping.
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::InvalidDate(_) | Self::UnknownSector(_) | Self::TooManyArticles { .. } => {
                ErrorClass::Client
            }
            Self::StoreUnavailable(_) => ErrorClass::Server,
        }
    }

    /// Suggested HTTP status code.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidDate(_) => 400,
            Self::UnknownSector(_) => 404,
            Self::TooManyArticles { .. } => 422,
            Self::StoreUnavailable(_) => 503,
        }
    }
}

/// Parses a `YYYY-MM-DD` date string from the calling layer.
///
/// # Errors
/// Returns [`AdvisorError::InvalidDate`] when the string is not a valid date.
pub fn parse_date(value: &str) -> Result<chrono::NaiveDate, AdvisorError> {
    chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| AdvisorError::InvalidDate(value.to_string()))
}
