//! Errors raised at the API boundary.
//!
//! Aggregation itself cannot fail; these cover talking to the monitoring
//! API and decoding what it returns.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Request to monitoring API failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unauthorized: the session is no longer valid, log in again")]
    Unauthorized,

    #[error("API returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Failed to decode API response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Unexpected response shape: {0}")]
    UnexpectedShape(String),

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Session has been invalidated")]
    SessionInactive,

    #[error("Invalid facility id: {0:?}")]
    InvalidFacilityId(String),
}

impl ApiError {
    /// True for errors that mean the user has to log in again.
    pub fn requires_login(&self) -> bool {
        matches!(self, ApiError::Unauthorized | ApiError::SessionInactive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_message() {
        let err = ApiError::Status {
            status: 500,
            message: "Database error".to_string(),
        };
        assert_eq!(err.to_string(), "API returned 500: Database error");
    }

    #[test]
    fn test_requires_login() {
        assert!(ApiError::Unauthorized.requires_login());
        assert!(ApiError::SessionInactive.requires_login());
        assert!(!ApiError::UnexpectedShape("x".to_string()).requires_login());
    }
}
