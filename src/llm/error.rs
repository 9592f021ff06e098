//! LLM backend errors

use thiserror::Error;

/// Errors that can occur while talking to an LLM backend
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// API request failed with the given message
    #[error("API error{}: {message}", status_suffix(.status_code))]
    ApiError {
        message: String,
        status_code: Option<u16>,
    },

    /// Request timed out after the specified duration (in seconds)
    #[error("Request timed out after {seconds} seconds")]
    TimeoutError { seconds: u64 },

    /// Invalid or malformed response from the LLM
    #[error("Invalid response from LLM: {message}")]
    InvalidResponse {
        message: String,
        raw_response: Option<String>,
    },

    /// Configuration error (missing API keys, invalid settings, etc.)
    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    /// Generic error for other cases
    #[error("Error: {message}")]
    Other { message: String },
}

fn status_suffix(status_code: &Option<u16>) -> String {
    status_code.map(|c| format!(" ({})", c)).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let with_code = BackendError::ApiError {
            message: "bad gateway".to_string(),
            status_code: Some(502),
        };
        assert_eq!(with_code.to_string(), "API error (502): bad gateway");

        let without_code = BackendError::ApiError {
            message: "connection reset".to_string(),
            status_code: None,
        };
        assert_eq!(without_code.to_string(), "API error: connection reset");
    }

    #[test]
    fn test_timeout_display() {
        let err = BackendError::TimeoutError { seconds: 30 };
        assert_eq!(err.to_string(), "Request timed out after 30 seconds");
    }
}
