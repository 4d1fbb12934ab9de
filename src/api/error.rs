//! Error types for backend calls and controller actions.

use thiserror::Error;

/// Errors that can occur while talking to the backend or validating user input.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Input rejected before any request was made.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Network failure or aborted stream.
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Backend answered with a non-2xx status.
    #[error("server returned status {status}: {body}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly empty.
        body: String,
    },

    /// Response did not have the expected shape.
    #[error("unexpected response: {0}")]
    Protocol(String),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Regex error.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// The same action is already running.
    #[error("{0} already in progress")]
    Busy(&'static str),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Coarse category of a [`ClientError`], as reported to the user.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caught before any request.
    Validation,
    /// Network-level failure.
    Transport,
    /// Non-2xx status.
    Server,
    /// Missing or malformed body.
    Protocol,
}

impl ClientError {
    /// Category of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::Busy(_) | Self::Config(_) | Self::InvalidUrl(_) | Self::Regex(_) => {
                ErrorKind::Validation
            }
            Self::Transport(_) | Self::Io(_) => ErrorKind::Transport,
            Self::Server { .. } => ErrorKind::Server,
            Self::Protocol(_) => ErrorKind::Protocol,
        }
    }
}
