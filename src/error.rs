//! Error types for the templating engine
//!
//! Interpolation, scope composition and ref id allocation are total and never
//! fail. Errors only come out of the fallible helpers around them: interval
//! string parsing, time range construction and configuration loading.

use thiserror::Error;

/// Main error type for the crate
#[derive(Error, Debug)]
pub enum Error {
    /// Interval string could not be parsed
    #[error("Invalid interval '{input}': {reason}")]
    InvalidInterval {
        /// The offending input
        input: String,
        /// Why it was rejected
        reason: String,
    },

    /// Time range validation failed
    #[error("Invalid time range: start {start} > end {end}")]
    InvalidTimeRange {
        /// Start timestamp
        start: i64,
        /// End timestamp
        end: i64,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Regex pattern used by a condition is invalid
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl Error {
    /// Create an invalid interval error
    pub fn invalid_interval(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidInterval {
            input: input.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

/// Validation errors
///
/// Raised by `Config::validate` and converted into `Error::Configuration`.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Value is out of allowed range
    #[error("{field} value {value} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Field name being validated
        field: String,
        /// The invalid value
        value: String,
        /// Minimum allowed value
        min: String,
        /// Maximum allowed value
        max: String,
    },

    /// Invalid format
    #[error("Invalid format for {field}: {message}")]
    InvalidFormat {
        /// Field name being validated
        field: String,
        /// Description of the format error
        message: String,
    },
}

impl From<ValidationError> for Error {
    fn from(e: ValidationError) -> Self {
        Error::Configuration(e.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
