//! Database models for sessions.
//!
//! Sessions are stored as keyed digests of the opaque token handed to the
//! browser. The raw token never reaches the database.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::types::{SessionId, UserId};

/// Database request for creating a new session
#[derive(Debug, Clone)]
pub struct SessionCreateDBRequest {
    pub user_id: UserId,
    pub token_digest: String,
    pub expires_at: DateTime<Utc>,
}

/// Database response for a session
#[derive(Debug, Clone, FromRow)]
pub struct SessionDBResponse {
    pub id: SessionId,
    pub user_id: UserId,
    pub token_digest: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

/// Database response for a session joined with its user, as produced by the
/// rolling-refresh query.
#[derive(Debug, Clone, FromRow)]
pub struct AuthSessionDBResponse {
    pub id: SessionId,
    pub user_id: UserId,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
