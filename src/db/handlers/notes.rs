//! Database repository for notes.

use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    db::{
        errors::{DbError, Result},
        handlers::repository::Repository,
        models::notes::{NoteCreateDBRequest, NoteDBResponse, NoteUpdateDBRequest},
    },
    types::{NoteId, UserId, abbrev_uuid},
};

/// Filter for listing notes
///
/// Notes are always listed per owner; there is no cross-user listing.
#[derive(Debug, Clone)]
pub struct NoteFilter {
    pub owner_id: UserId,
}

impl NoteFilter {
    pub fn new(owner_id: UserId) -> Self {
        Self { owner_id }
    }
}

pub struct Notes<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Notes<'c> {
    type CreateRequest = NoteCreateDBRequest;
    type UpdateRequest = NoteUpdateDBRequest;
    type Response = NoteDBResponse;
    type Id = NoteId;
    type Filter = NoteFilter;

    #[instrument(skip(self, request), fields(owner_id = %abbrev_uuid(&request.owner_id)), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        // Always generate a new ID for notes
        let note_id = Uuid::new_v4();

        let note = sqlx::query_as::<_, NoteDBResponse>(
            r#"
            INSERT INTO notes (id, owner_id, title, text)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(note_id)
        .bind(request.owner_id)
        .bind(&request.title)
        .bind(&request.text)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(note)
    }

    #[instrument(skip(self), fields(note_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let note = sqlx::query_as::<_, NoteDBResponse>("SELECT * FROM notes WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(note)
    }

    #[instrument(skip(self, filter), fields(owner_id = %abbrev_uuid(&filter.owner_id)), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        // Insertion order, with the id as a tiebreak for equal timestamps
        let notes = sqlx::query_as::<_, NoteDBResponse>("SELECT * FROM notes WHERE owner_id = $1 ORDER BY created_at ASC, id ASC")
            .bind(filter.owner_id)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(notes)
    }

    #[instrument(skip(self), fields(note_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM notes WHERE id = $1").bind(id).execute(&mut *self.db).await?;

        Ok(result.rows_affected() > 0)
    }

    /// Replace a note's content.
    ///
    /// This is a full replace rather than a patch: binding a `None` text
    /// clears the stored text.
    #[instrument(skip(self, request), fields(note_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let note = sqlx::query_as::<_, NoteDBResponse>(
            r#"
            UPDATE notes SET
                title = $2,
                text = $3,
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.title)
        .bind(&request.text)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(note)
    }
}

impl<'c> Notes<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}
