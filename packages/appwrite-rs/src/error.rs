//! Error types for the Appwrite client.

use thiserror::Error;

/// Result type for Appwrite client operations.
pub type Result<T> = std::result::Result<T, AppwriteError>;

/// Appwrite client errors.
#[derive(Debug, Error)]
pub enum AppwriteError {
    /// Network error (connection failed, timeout)
    #[error("Network error: {0}")]
    Network(String),

    /// API error (non-2xx response from Appwrite)
    #[error("API error ({code}): {message}")]
    Api { code: u16, message: String },

    /// Parse error (invalid JSON, unexpected response format)
    #[error("Parse error: {0}")]
    Parse(String),
}

impl AppwriteError {
    /// Whether this error is Appwrite throttling the caller.
    ///
    /// Appwrite signals throttling with HTTP 429; older server versions
    /// only put "Rate limit" in the message body.
    pub fn is_rate_limit(&self) -> bool {
        match self {
            Self::Api { code, message } => *code == 429 || message.contains("Rate limit"),
            _ => false,
        }
    }
}

impl From<reqwest::Error> for AppwriteError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Parse(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_429_is_rate_limit() {
        let err = AppwriteError::Api {
            code: 429,
            message: "Too many requests".to_string(),
        };
        assert!(err.is_rate_limit());
    }

    #[test]
    fn test_message_marker_is_rate_limit() {
        let err = AppwriteError::Api {
            code: 500,
            message: "Rate limit for the current endpoint has been exceeded".to_string(),
        };
        assert!(err.is_rate_limit());
    }

    #[test]
    fn test_other_errors_are_not_rate_limit() {
        let err = AppwriteError::Api {
            code: 404,
            message: "Document not found".to_string(),
        };
        assert!(!err.is_rate_limit());
        assert!(!AppwriteError::Network("timeout".to_string()).is_rate_limit());
    }
}
