/*!
 * Error types for the toass application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when talking to a text-conversion service
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// The service answered 200 but reported a failure in its payload
    #[error("Service reported error code {code}: {message}")]
    ServiceError {
        /// Service-level status code (anything but 0)
        code: i64,
        /// Message reported by the service
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The request did not complete within the client timeout
    #[error("Request timed out: {0}")]
    Timeout(String),
}

impl ProviderError {
    /// Whether retrying the same request could plausibly succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RequestFailed(_) | Self::ConnectionError(_) | Self::Timeout(_) => true,
            Self::ApiError { status_code, .. } => *status_code == 429 || *status_code >= 500,
            Self::ParseError(_) | Self::ServiceError { .. } => false,
        }
    }
}

/// Errors that can occur while parsing subtitle text
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SubtitleError {
    /// Malformed subtitle syntax at a 1-based line number
    #[error("line {line}: {message}")]
    Parse {
        /// 1-based line number of the offending line
        line: usize,
        /// What was wrong with it
        message: String,
    },

    /// A timestamp that could not be read
    #[error("invalid timestamp '{0}'")]
    InvalidTimestamp(String),
}

impl SubtitleError {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }
}

/// Errors that terminate a single conversion job
#[derive(Error, Debug)]
pub enum ConversionError {
    /// The source extension is not one of srt, vtt or ass
    #[error("Unsupported subtitle format: {}", path.display())]
    UnsupportedFormat {
        /// Offending source path
        path: PathBuf,
    },

    /// The source could not be read as UTF-8 text
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The source is not well-formed for its format
    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: SubtitleError,
    },

    /// The text-conversion service failed
    #[error("Text conversion failed: {0}")]
    TextConversion(#[from] ProviderError),

    /// The text-conversion service returned fewer lines than were sent
    #[error("Text conversion returned {received} lines for {expected} events")]
    TextConversionPartial {
        /// Number of lines sent
        expected: usize,
        /// Number of lines received
        received: usize,
    },

    /// A selected insert config has unusable timestamps
    #[error("Invalid insert config '{name}': {message}")]
    InvalidInsertConfig { name: String, message: String },

    /// The destination could not be written
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Another source in the same batch already writes this destination
    #[error("Output {} is already written by {}", path.display(), owner.display())]
    DestinationConflict {
        /// Shared destination
        path: PathBuf,
        /// Source that keeps the destination
        owner: PathBuf,
    },

    /// The source could not be removed after a successful write
    #[error("Failed to delete {}: {source}", path.display())]
    Delete {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error in the persisted configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from subtitle processing
    #[error("Subtitle error: {0}")]
    Subtitle(#[from] SubtitleError),

    /// Error from a conversion job
    #[error("Conversion error: {0}")]
    Conversion(#[from] ConversionError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
