//! Database models for notes.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::types::{NoteId, UserId};

/// Database request for creating a new note
#[derive(Debug, Clone)]
pub struct NoteCreateDBRequest {
    pub owner_id: UserId,
    pub title: String,
    pub text: String,
}

/// Database request for updating a note
///
/// Updates replace the full content: a `None` text clears the stored text.
#[derive(Debug, Clone)]
pub struct NoteUpdateDBRequest {
    pub title: String,
    pub text: Option<String>,
}

/// Database response for a note
#[derive(Debug, Clone, FromRow)]
pub struct NoteDBResponse {
    pub id: NoteId,
    pub owner_id: UserId,
    pub title: String,
    pub text: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
