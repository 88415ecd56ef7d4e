//! Error types

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, VerifyError>;

/// Errors that reject a verification attempt outright.
///
/// Engine failures and report failures are not represented here: the
/// orchestrator downgrades them to an inconclusive outcome or a diagnostic.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VerifyError {
    #[error("Invalid subject: {message}")]
    InvalidSubject { message: String },

    #[error("Invalid method: {message}")]
    InvalidMethod { message: String },

    /// Operation called in a state that does not permit it
    #[error("Usage error: {message}")]
    Usage { message: String },

    #[error("Settings error: {message}")]
    Settings { message: String },

    #[error("IO error: {message}")]
    Io { message: String },
}

impl VerifyError {
    pub fn invalid_subject(message: impl Into<String>) -> Self {
        Self::InvalidSubject {
            message: message.into(),
        }
    }

    pub fn invalid_method(message: impl Into<String>) -> Self {
        Self::InvalidMethod {
            message: message.into(),
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
        }
    }

    pub fn settings(message: impl Into<String>) -> Self {
        Self::Settings {
            message: message.into(),
        }
    }

    pub fn io_error(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// True for errors raised while building a request
    pub fn is_construction_error(&self) -> bool {
        matches!(self, Self::InvalidSubject { .. } | Self::InvalidMethod { .. })
    }

    pub fn is_usage_error(&self) -> bool {
        matches!(self, Self::Usage { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            Self::InvalidSubject { message } => message,
            Self::InvalidMethod { message } => message,
            Self::Usage { message } => message,
            Self::Settings { message } => message,
            Self::Io { message } => message,
        }
    }
}

impl From<std::io::Error> for VerifyError {
    fn from(err: std::io::Error) -> Self {
        Self::io_error(err.to_string())
    }
}
