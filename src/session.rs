//! Authenticated session context.
//!
//! A session is created by a successful login and handed explicitly to
//! every API call. It ends on logout or when the API answers with an
//! authorization failure; after that no bearer token is handed out.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// The logged-in administrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    pub email: String,
}

/// Why a session stopped being valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidationReason {
    Logout,
    /// The API rejected the token (HTTP 401).
    Unauthorized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Active,
    Invalidated(InvalidationReason),
}

/// Session context for API calls.
#[derive(Debug, Clone)]
pub struct Session {
    token: String,
    user: SessionUser,
    created_at: DateTime<Utc>,
    state: SessionState,
}

impl Session {
    /// Start a session from a login response.
    pub fn new(token: String, user: SessionUser) -> Self {
        info!("Session started for {}", user.email);
        Self {
            token,
            user,
            created_at: Utc::now(),
            state: SessionState::Active,
        }
    }

    pub fn user(&self) -> &SessionUser {
        &self.user
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    /// The bearer token, only while the session is active.
    pub fn bearer_token(&self) -> Option<&str> {
        self.is_active().then_some(self.token.as_str())
    }

    /// End the session at the user's request.
    pub fn logout(&mut self) {
        self.invalidate(InvalidationReason::Logout);
    }

    /// End the session after the API rejected its token.
    pub fn invalidate_unauthorized(&mut self) {
        self.invalidate(InvalidationReason::Unauthorized);
    }

    fn invalidate(&mut self, reason: InvalidationReason) {
        // First reason wins.
        if self.is_active() {
            debug!("Session for {} invalidated: {:?}", self.user.email, reason);
            self.state = SessionState::Invalidated(reason);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new(
            "token-123".to_string(),
            SessionUser {
                id: "u1".to_string(),
                email: "admin@health.gov".to_string(),
            },
        )
    }

    #[test]
    fn test_new_session_is_active() {
        let session = session();
        assert!(session.is_active());
        assert_eq!(session.bearer_token(), Some("token-123"));
        assert_eq!(session.user().email, "admin@health.gov");
        assert!(session.created_at() <= Utc::now());
    }

    #[test]
    fn test_logout_revokes_token() {
        let mut session = session();
        session.logout();

        assert!(!session.is_active());
        assert_eq!(session.bearer_token(), None);
        assert_eq!(
            session.state(),
            SessionState::Invalidated(InvalidationReason::Logout)
        );
    }

    #[test]
    fn test_unauthorized_revokes_token() {
        let mut session = session();
        session.invalidate_unauthorized();

        assert_eq!(session.bearer_token(), None);
        assert_eq!(
            session.state(),
            SessionState::Invalidated(InvalidationReason::Unauthorized)
        );
    }

    #[test]
    fn test_first_invalidation_reason_kept() {
        let mut session = session();
        session.invalidate_unauthorized();
        session.logout();

        assert_eq!(
            session.state(),
            SessionState::Invalidated(InvalidationReason::Unauthorized)
        );
    }
}
