//! OpenAPI documentation configuration.
//!
//! Aggregates every route's `#[utoipa::path]` annotation into one document,
//! served at `/api-docs/openapi.json` and rendered at `/docs`.

use utoipa::OpenApi;

use crate::api;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::users::sign_up,
        api::handlers::users::login,
        api::handlers::users::logout,
        api::handlers::users::get_authenticated_user,
        api::handlers::notes::get_notes,
        api::handlers::notes::get_note,
        api::handlers::notes::create_note,
        api::handlers::notes::update_note,
        api::handlers::notes::delete_note,
    ),
    components(
        schemas(
            api::models::users::SignupRequest,
            api::models::users::LoginRequest,
            api::models::users::UserResponse,
            api::models::users::LoginUserResponse,
            api::models::notes::CreateNoteRequest,
            api::models::notes::UpdateNoteRequest,
            api::models::notes::NoteResponse,
            api::models::Data<api::models::users::UserResponse>,
            api::models::Data<api::models::users::LoginUserResponse>,
            api::models::Data<api::models::notes::NoteResponse>,
        )
    ),
    tags(
        (name = "users", description = "Account lifecycle: sign-up, login, logout, and session introspection.

Signing up or logging in sets an HTTP-only session cookie; subsequent requests are authenticated by that cookie alone, and every authenticated request extends the session's lifetime."),
        (name = "notes", description = "Note CRUD, scoped to the authenticated owner.

All note routes require a live session and only ever operate on the caller's own notes; touching someone else's note answers 401.")
    ),
    info(
        title = "Quill API",
        description = "Self-hostable note-taking backend with cookie-session authentication.

## Errors

Failures share one shape, an error message inside the data envelope:

```json
{
  \"data\": {
    \"error\": \"note not found\"
  }
}
```

The one deliberate exception to the envelope is `GET /api/notes`, whose success response is a bare JSON array.",
    ),
)]
pub struct ApiDoc;
