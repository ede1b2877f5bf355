//! Error types for the job client and its input boundary.

use thiserror::Error;

/// Rejected user input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Video URL is required")]
    EmptyUrl,

    #[error("Video URL {url:?} is not a valid HTTP/HTTPS link: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("{field} must be a whole number, got {raw:?}")]
    NotANumber { field: &'static str, raw: String },

    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfBounds {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },
}

/// The create-job request failed. Surfaced to the user.
#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("Invalid request: {0}")]
    Validation(#[from] ValidationError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// A status check failed. Logged and retried on the next tick.
#[derive(Debug, Error)]
pub enum PollError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var}={value:?} is invalid: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}
