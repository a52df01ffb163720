//! Client error types

use std::collections::HashMap;

use shared::error::ErrorCode;
use thiserror::Error;

/// Client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid response format
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// No session is present
    #[error("Not authenticated")]
    NotAuthenticated,

    /// Backend rejected the credentials or token
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Permission denied
    #[error("Permission denied: {0}")]
    Forbidden(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// A submit is already in flight
    #[error("Submit already in progress")]
    SubmitInFlight,

    /// Structured backend error
    #[error("API error {code}: {message}")]
    Api {
        code: ErrorCode,
        message: String,
        details: Option<HashMap<String, serde_json::Value>>,
    },

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ClientError {
    /// Whether the failure means the caller has no valid session
    pub fn is_auth(&self) -> bool {
        match self {
            Self::NotAuthenticated | Self::Unauthorized(_) => true,
            Self::Api { code, .. } => code.http_status() == http::StatusCode::UNAUTHORIZED,
            _ => false,
        }
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_auth() {
        assert!(ClientError::NotAuthenticated.is_auth());
        assert!(ClientError::Unauthorized("expired".into()).is_auth());
        assert!(
            ClientError::Api {
                code: ErrorCode::TokenExpired,
                message: "expired".into(),
                details: None,
            }
            .is_auth()
        );
        assert!(!ClientError::Validation("name".into()).is_auth());
        assert!(
            !ClientError::Api {
                code: ErrorCode::EmployeeNotFound,
                message: "gone".into(),
                details: None,
            }
            .is_auth()
        );
    }
}
