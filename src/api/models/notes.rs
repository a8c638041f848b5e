//! API request/response models for notes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::models::notes::NoteDBResponse;
use crate::types::{NoteId, UserId};

// Note request models
//
// Fields deserialize as optional; handlers turn absent or empty content into
// the canonical validation message.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateNoteRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

/// Body for updating a note. The title is required; omitting `text` clears it
/// (updates replace the full content).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateNoteRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

// Note response models
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NoteResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: NoteId,
    #[schema(value_type = String, format = "uuid")]
    pub owner_id: UserId,
    pub title: String,
    pub text: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<NoteDBResponse> for NoteResponse {
    fn from(db: NoteDBResponse) -> Self {
        Self {
            id: db.id,
            owner_id: db.owner_id,
            title: db.title,
            text: db.text,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
