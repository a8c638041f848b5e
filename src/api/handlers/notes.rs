//! Note CRUD handlers. Every route requires an authenticated session and only
//! ever sees the caller's own notes.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::debug;
use uuid::Uuid;

use crate::{
    AppState,
    api::models::{
        Data,
        notes::{CreateNoteRequest, NoteResponse, UpdateNoteRequest},
        users::CurrentUser,
    },
    db::{
        errors::DbError,
        handlers::{Notes, Repository, notes::NoteFilter},
        models::notes::{NoteCreateDBRequest, NoteDBResponse, NoteUpdateDBRequest},
        with_timeout,
    },
    errors::{AppJson, Error},
    types::{NoteId, UserId},
};

const MISSING_TITLE_OR_TEXT: &str = "Please provide title and description";
const CANNOT_ACCESS_NOTE: &str = "You cannot access this note";
// get and update share one spelling of the id and not-found messages; delete
// has its own, kept for wire compatibility.
const INVALID_NOTE_ID: &str = "Please provide a valid note id";
const NOTE_NOT_FOUND: &str = "note not found";
const INVALID_NOTE_ID_DELETE: &str = "Invalid note id";
const NOTE_NOT_FOUND_DELETE: &str = "Note not found";

/// Treat absent and empty-string input the same way; both are missing.
fn require(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

fn parse_note_id(raw: &str, message: &str) -> Result<NoteId, Error> {
    Uuid::parse_str(raw).map_err(|_| Error::Validation {
        message: message.to_string(),
    })
}

/// Load a note and check the caller owns it: existence before ownership, so a
/// probe with a random id cannot distinguish "absent" from "someone else's".
async fn load_owned_note(state: &AppState, user_id: UserId, note_id: NoteId, not_found_message: &str) -> Result<NoteDBResponse, Error> {
    let note = with_timeout(state.config.op_timeout, "load note", async {
        let mut conn = state.db.acquire().await.map_err(DbError::from)?;
        let mut note_repo = Notes::new(&mut conn);
        note_repo.get_by_id(note_id).await
    })
    .await?
    .ok_or_else(|| Error::NotFound {
        message: not_found_message.to_string(),
    })?;

    if note.owner_id != user_id {
        return Err(Error::NotOwner {
            message: CANNOT_ACCESS_NOTE.to_string(),
        });
    }

    Ok(note)
}

/// List the caller's notes
#[utoipa::path(
    get,
    path = "/api/notes",
    responses(
        (status = 200, description = "Every note owned by the caller, oldest first", body = Vec<NoteResponse>),
        (status = 401, description = "Not authenticated")
    ),
    tag = "notes"
)]
#[tracing::instrument(skip_all)]
pub async fn get_notes(State(state): State<AppState>, user: CurrentUser) -> Result<Json<Vec<NoteResponse>>, Error> {
    let notes = with_timeout(state.config.op_timeout, "list notes", async {
        let mut conn = state.db.acquire().await.map_err(DbError::from)?;
        let mut note_repo = Notes::new(&mut conn);
        note_repo.list(&NoteFilter::new(user.id)).await
    })
    .await?;

    // The collection is the one un-enveloped success: a bare JSON array
    Ok(Json(notes.into_iter().map(NoteResponse::from).collect()))
}

/// Get a single note by id
#[utoipa::path(
    get,
    path = "/api/notes/{note_id}",
    params(("note_id" = String, Path, description = "Note id")),
    responses(
        (status = 200, description = "The requested note", body = Data<NoteResponse>),
        (status = 400, description = "Malformed note id"),
        (status = 401, description = "Not authenticated, or not the owner"),
        (status = 404, description = "No such note")
    ),
    tag = "notes"
)]
#[tracing::instrument(skip_all)]
pub async fn get_note(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(note_id): Path<String>,
) -> Result<Json<Data<NoteResponse>>, Error> {
    let note_id = parse_note_id(&note_id, INVALID_NOTE_ID)?;
    let note = load_owned_note(&state, user.id, note_id, NOTE_NOT_FOUND).await?;

    Ok(Json(Data::new(note.into())))
}

/// Create a note owned by the caller
#[utoipa::path(
    post,
    path = "/api/notes",
    request_body = CreateNoteRequest,
    responses(
        (status = 201, description = "Note created", body = Data<NoteResponse>),
        (status = 400, description = "Missing title or text"),
        (status = 401, description = "Not authenticated")
    ),
    tag = "notes"
)]
#[tracing::instrument(skip_all)]
pub async fn create_note(
    State(state): State<AppState>,
    user: CurrentUser,
    AppJson(request): AppJson<CreateNoteRequest>,
) -> Result<(StatusCode, Json<Data<NoteResponse>>), Error> {
    // Create requires both fields; update only requires the title
    let (Some(title), Some(text)) = (require(&request.title), require(&request.text)) else {
        return Err(Error::Validation {
            message: MISSING_TITLE_OR_TEXT.to_string(),
        });
    };

    let note = with_timeout(state.config.op_timeout, "create note", async {
        let mut conn = state.db.acquire().await.map_err(DbError::from)?;
        let mut note_repo = Notes::new(&mut conn);
        note_repo
            .create(&NoteCreateDBRequest {
                owner_id: user.id,
                title: title.to_string(),
                text: text.to_string(),
            })
            .await
    })
    .await?;

    debug!("Note created: {}", note.id);

    Ok((StatusCode::CREATED, Json(Data::new(note.into()))))
}

/// Replace a note's title and text
#[utoipa::path(
    patch,
    path = "/api/notes/{note_id}",
    params(("note_id" = String, Path, description = "Note id")),
    request_body = UpdateNoteRequest,
    responses(
        (status = 200, description = "The updated note", body = Data<NoteResponse>),
        (status = 400, description = "Malformed note id, or missing title"),
        (status = 401, description = "Not authenticated, or not the owner"),
        (status = 404, description = "No such note")
    ),
    tag = "notes"
)]
#[tracing::instrument(skip_all)]
pub async fn update_note(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(note_id): Path<String>,
    AppJson(request): AppJson<UpdateNoteRequest>,
) -> Result<Json<Data<NoteResponse>>, Error> {
    let note_id = parse_note_id(&note_id, INVALID_NOTE_ID)?;

    let Some(title) = require(&request.title) else {
        return Err(Error::Validation {
            message: MISSING_TITLE_OR_TEXT.to_string(),
        });
    };

    load_owned_note(&state, user.id, note_id, NOTE_NOT_FOUND).await?;

    // Full replace: the request's text is stored as-is, and omitting it
    // clears what was there.
    let update = NoteUpdateDBRequest {
        title: title.to_string(),
        text: request.text,
    };

    let note = with_timeout(state.config.op_timeout, "update note", async {
        let mut conn = state.db.acquire().await.map_err(DbError::from)?;
        let mut note_repo = Notes::new(&mut conn);
        note_repo.update(note_id, &update).await
    })
    .await?;

    Ok(Json(Data::new(note.into())))
}

/// Delete a note
#[utoipa::path(
    delete,
    path = "/api/notes/{note_id}",
    params(("note_id" = String, Path, description = "Note id")),
    responses(
        (status = 204, description = "Note deleted"),
        (status = 400, description = "Malformed note id"),
        (status = 401, description = "Not authenticated, or not the owner"),
        (status = 404, description = "No such note")
    ),
    tag = "notes"
)]
#[tracing::instrument(skip_all)]
pub async fn delete_note(State(state): State<AppState>, user: CurrentUser, Path(note_id): Path<String>) -> Result<StatusCode, Error> {
    let note_id = parse_note_id(&note_id, INVALID_NOTE_ID_DELETE)?;
    load_owned_note(&state, user.id, note_id, NOTE_NOT_FOUND_DELETE).await?;

    with_timeout(state.config.op_timeout, "delete note", async {
        let mut conn = state.db.acquire().await.map_err(DbError::from)?;
        let mut note_repo = Notes::new(&mut conn);
        note_repo.delete(note_id).await
    })
    .await?;

    debug!("Note deleted: {note_id}");

    Ok(StatusCode::NO_CONTENT)
}
