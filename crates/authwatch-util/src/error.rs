//! Error types for authwatch

use thiserror::Error;

/// Core error type for authwatch operations
#[derive(Debug, Error)]
pub enum AuthwatchError {
    #[error("Invalid URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    #[error("Transport error: {0}")]
    TransportError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AuthwatchError {
    pub fn invalid_url(url: impl Into<String>, message: impl ToString) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            message: message.to_string(),
        }
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::TransportError(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, AuthwatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_url_message_names_the_url() {
        let err = AuthwatchError::invalid_url("not a url", "relative URL without a base");
        assert_eq!(
            err.to_string(),
            "Invalid URL 'not a url': relative URL without a base"
        );
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: AuthwatchError = io.into();
        assert!(matches!(err, AuthwatchError::Io(_)));
    }
}
