//! Session-token authentication.
//!
//! Tokens are issued elsewhere; this module only asks a [`SessionResolver`]
//! which user a token belongs to.

use async_trait::async_trait;
use axum::http::HeaderMap;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use super::error::ApiError;
use super::state::AppState;
use crate::storage::Database;

/// Request header carrying the session token.
pub const SESSION_TOKEN_HEADER: &str = "x-session-token";

/// The authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct User {
    pub id: i64,
}

#[derive(Debug, Error)]
pub enum AuthError {
    /// The token is unknown or no longer valid
    #[error("invalid session token")]
    InvalidToken,
    /// The session backend could not answer
    #[error("session lookup failed: {0}")]
    Backend(String),
}

/// Maps a session token to its user.
#[async_trait]
pub trait SessionResolver: Send + Sync {
    async fn user_for_session_token(&self, token: &SecretString) -> Result<User, AuthError>;
}

/// Resolves tokens from the `sessions` table of the subscription database.
#[derive(Clone)]
pub struct SqliteSessions {
    db: Database,
}

impl SqliteSessions {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SessionResolver for SqliteSessions {
    async fn user_for_session_token(&self, token: &SecretString) -> Result<User, AuthError> {
        match self.db.user_for_session_token(token.expose_secret()).await {
            Ok(Some(id)) => Ok(User { id }),
            Ok(None) => Err(AuthError::InvalidToken),
            Err(e) => Err(AuthError::Backend(e.to_string())),
        }
    }
}

/// Authenticates a request from its `x-session-token` header.
pub(crate) async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<User, ApiError> {
    let token = headers
        .get(SESSION_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| SecretString::from(value.to_owned()))
        .ok_or(ApiError::AuthMissing)?;

    state
        .sessions
        .user_for_session_token(&token)
        .await
        .map_err(|e| match e {
            AuthError::InvalidToken => ApiError::AuthInvalid,
            AuthError::Backend(msg) => {
                tracing::error!(operation = "authenticate", error = %msg, "Session lookup failed");
                ApiError::Store
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sqlite_sessions_resolve() {
        let db = Database::open(":memory:").await.unwrap();
        db.create_session("secret-token", 5).await.unwrap();
        let sessions = SqliteSessions::new(db);

        let user = sessions
            .user_for_session_token(&SecretString::from("secret-token".to_owned()))
            .await
            .unwrap();
        assert_eq!(user, User { id: 5 });
    }

    #[tokio::test]
    async fn test_sqlite_sessions_reject_unknown() {
        let db = Database::open(":memory:").await.unwrap();
        let sessions = SqliteSessions::new(db);

        let result = sessions
            .user_for_session_token(&SecretString::from("unknown".to_owned()))
            .await;
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }
}
