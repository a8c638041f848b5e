//! Account handlers: sign-up, login, logout, and the current-user endpoint
//! a frontend polls on load to restore its session.

use axum::{Json, extract::State};
use chrono::Utc;
use tracing::{debug, info};

use crate::{
    AppState,
    api::models::{
        Data,
        users::{LoginRequest, LoginResponse, LoginUserResponse, LogoutResponse, SignupRequest, SignupResponse, UserResponse},
    },
    auth::{
        current_user::OptionalSession,
        password::{self, Argon2Params},
        session,
    },
    db::{
        errors::DbError,
        handlers::{Repository, Sessions, Users},
        models::{sessions::SessionCreateDBRequest, users::UserCreateDBRequest},
        with_timeout,
    },
    errors::{AppJson, Error},
    types::UserId,
};

const PARAMETERS_MISSING: &str = "Parameters missing";
const USERNAME_TAKEN: &str = "Username already taken, Please choose a different name";
const EMAIL_TAKEN: &str = "Email already taken, Please choose a different email";
const INVALID_CREDENTIALS: &str = "Invalid Credentials";

/// Treat absent and empty-string input the same way; both are missing.
fn require(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// Mint a session for a freshly authenticated user: generate a token, persist
/// its digest, and format the cookie carrying the raw token. Both signup and
/// login go through here, so each always gets a brand new session row.
async fn establish_session(state: &AppState, user_id: UserId) -> Result<String, Error> {
    let token = session::generate_session_token();
    let token_digest = session::digest_session_token(&token, &state.config)?;
    let expires_at = Utc::now() + state.config.session.timeout;

    with_timeout(state.config.op_timeout, "create session", async {
        let mut conn = state.db.acquire().await.map_err(DbError::from)?;
        let mut session_repo = Sessions::new(&mut conn);
        session_repo
            .create(&SessionCreateDBRequest {
                user_id,
                token_digest,
                expires_at,
            })
            .await
    })
    .await?;

    Ok(session::session_cookie(&token, &state.config))
}

/// Create a new account and log it in
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created and session established", body = Data<UserResponse>),
        (status = 400, description = "Missing username, email, or password"),
        (status = 409, description = "Username or email already taken")
    ),
    tag = "users"
)]
#[tracing::instrument(skip_all)]
pub async fn sign_up(State(state): State<AppState>, AppJson(request): AppJson<SignupRequest>) -> Result<SignupResponse, Error> {
    let (Some(username), Some(email), Some(password)) =
        (require(&request.username), require(&request.email), require(&request.password))
    else {
        return Err(Error::Validation {
            message: PARAMETERS_MISSING.to_string(),
        });
    };

    // Pre-check both uniques so the client learns which field collided,
    // username first. Concurrent signups can still race past this; the insert
    // below maps the constraint violation to the same response.
    with_timeout(state.config.op_timeout, "check for existing user", async {
        let mut conn = state.db.acquire().await.map_err(DbError::from)?;
        let mut user_repo = Users::new(&mut conn);

        if user_repo.get_user_by_username(username).await?.is_some() {
            return Err(Error::Conflict {
                message: USERNAME_TAKEN.to_string(),
            });
        }
        if user_repo.get_user_by_email(email).await?.is_some() {
            return Err(Error::Conflict {
                message: EMAIL_TAKEN.to_string(),
            });
        }

        Ok(())
    })
    .await?;

    // Hash the password in a blocking task since Argon2 is CPU-intensive
    let password_owned = password.to_string();
    let params = Argon2Params::from(&state.config.password);
    let password_hash = tokio::task::spawn_blocking(move || password::hash_string_with_params(&password_owned, Some(params)))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password hashing task: {e}"),
        })??;

    let user = with_timeout(state.config.op_timeout, "create user", async {
        let mut conn = state.db.acquire().await.map_err(DbError::from)?;
        let mut user_repo = Users::new(&mut conn);
        user_repo
            .create(&UserCreateDBRequest {
                username: username.to_string(),
                email: email.to_string(),
                password_hash,
            })
            .await
    })
    .await
    .map_err(|e| match e {
        Error::Database(db_err) if db_err.violates_constraint("users_username_key") => Error::Conflict {
            message: USERNAME_TAKEN.to_string(),
        },
        Error::Database(db_err) if db_err.violates_constraint("users_email_key") => Error::Conflict {
            message: EMAIL_TAKEN.to_string(),
        },
        other => other,
    })?;

    info!("New user signed up: {}", user.username);

    let cookie = establish_session(&state, user.id).await?;

    Ok(SignupResponse { user: user.into(), cookie })
}

/// Log in with email and password
#[utoipa::path(
    post,
    path = "/api/users/login",
    request_body = LoginRequest,
    responses(
        (status = 201, description = "Session established", body = Data<LoginUserResponse>),
        (status = 400, description = "Missing email or password"),
        (status = 401, description = "Unknown email or wrong password")
    ),
    tag = "users"
)]
#[tracing::instrument(skip_all)]
pub async fn login(State(state): State<AppState>, AppJson(request): AppJson<LoginRequest>) -> Result<LoginResponse, Error> {
    let (Some(email), Some(password)) = (require(&request.email), require(&request.password)) else {
        return Err(Error::Validation {
            message: PARAMETERS_MISSING.to_string(),
        });
    };

    let user = with_timeout(state.config.op_timeout, "look up user for login", async {
        let mut conn = state.db.acquire().await.map_err(DbError::from)?;
        let mut user_repo = Users::new(&mut conn);
        user_repo.get_user_by_email(email).await
    })
    .await?
    // Unknown email and wrong password produce identical responses
    .ok_or_else(|| Error::Unauthenticated {
        message: Some(INVALID_CREDENTIALS.to_string()),
    })?;

    // Verify the password in a blocking task since Argon2 is CPU-intensive
    let password_owned = password.to_string();
    let password_hash = user.password_hash.clone();
    let verified = tokio::task::spawn_blocking(move || password::verify_string(&password_owned, &password_hash))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password verification task: {e}"),
        })??;

    if !verified {
        debug!("Password mismatch for {}", user.email);
        return Err(Error::Unauthenticated {
            message: Some(INVALID_CREDENTIALS.to_string()),
        });
    }

    info!("User logged in: {}", user.username);

    let cookie = establish_session(&state, user.id).await?;

    Ok(LoginResponse { user: user.into(), cookie })
}

/// Log out, revoking the current session
#[utoipa::path(
    get,
    path = "/api/users/logout",
    responses(
        (status = 200, description = "Session revoked and cookie cleared"),
        (status = 500, description = "Session store failure")
    ),
    tag = "users"
)]
#[tracing::instrument(skip_all)]
pub async fn logout(State(state): State<AppState>, OptionalSession(auth): OptionalSession) -> Result<LogoutResponse, Error> {
    // Logout without a live session is a success; the cookie is cleared either
    // way, so repeated logouts are idempotent.
    if let Some(auth) = auth {
        with_timeout(state.config.op_timeout, "delete session", async {
            let mut conn = state.db.acquire().await.map_err(DbError::from)?;
            let mut session_repo = Sessions::new(&mut conn);
            session_repo.delete(auth.session_id).await
        })
        .await?;

        debug!("Session revoked for {}", auth.user.username);
    }

    Ok(LogoutResponse {
        cookie: session::clear_session_cookie(&state.config),
    })
}

/// Get the currently authenticated user
#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "The authenticated user, or data: null for anonymous traffic", body = Data<UserResponse>)
    ),
    tag = "users"
)]
#[tracing::instrument(skip_all)]
pub async fn get_authenticated_user(OptionalSession(auth): OptionalSession) -> Json<Data<Option<UserResponse>>> {
    // The session middleware already resolved and refreshed the session; an
    // anonymous or stale cookie answers null rather than 401 so the frontend
    // can always probe this endpoint.
    Json(Data::new(auth.map(|auth| UserResponse::from(auth.user))))
}

#[cfg(test)]
mod tests {
    use crate::test_utils::create_test_app;
    use axum::http::{StatusCode, header};
    use axum_test::{TestResponse, TestServer};
    use serde_json::{Value, json};
    use sqlx::PgPool;

    /// Extract the `name=token` pair from the response's Set-Cookie header.
    fn session_cookie_pair(response: &TestResponse) -> String {
        let set_cookie = response
            .headers()
            .get("set-cookie")
            .expect("expected a Set-Cookie header")
            .to_str()
            .unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }

    async fn signup(server: &TestServer, username: &str) -> TestResponse {
        server
            .post("/api/users")
            .json(&json!({
                "username": username,
                "email": format!("{username}@example.com"),
                "password": "hunter2hunter2",
            }))
            .await
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_signup_creates_account_and_session(pool: PgPool) {
        let (server, _bg) = create_test_app(pool).await;

        let response = signup(&server, "alice").await;
        response.assert_status(StatusCode::CREATED);

        let body: Value = response.json();
        assert_eq!(body["data"]["username"], "alice");
        assert_eq!(body["data"]["email"], "alice@example.com");
        assert!(body["data"]["id"].is_string());
        assert!(body["data"].get("password_hash").is_none());

        let set_cookie = response.headers().get("set-cookie").unwrap().to_str().unwrap();
        assert!(set_cookie.contains("HttpOnly"));
        assert!(set_cookie.contains("SameSite=Lax"));

        // The fresh session authenticates the current-user endpoint
        let me = server.get("/api/users").add_header(header::COOKIE, session_cookie_pair(&response)).await;
        me.assert_status_ok();
        let me_body: Value = me.json();
        assert_eq!(me_body["data"]["username"], "alice");
        assert_eq!(me_body["data"]["email"], "alice@example.com");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_signup_missing_or_empty_fields(pool: PgPool) {
        let (server, _bg) = create_test_app(pool).await;

        let missing = server
            .post("/api/users")
            .json(&json!({ "username": "alice", "email": "alice@example.com" }))
            .await;
        missing.assert_status(StatusCode::BAD_REQUEST);
        missing.assert_json(&json!({ "data": { "error": "Parameters missing" } }));

        // Empty string counts as missing too
        let empty = server
            .post("/api/users")
            .json(&json!({ "username": "", "email": "alice@example.com", "password": "hunter2" }))
            .await;
        empty.assert_status(StatusCode::BAD_REQUEST);
        empty.assert_json(&json!({ "data": { "error": "Parameters missing" } }));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_signup_malformed_body_uses_error_envelope(pool: PgPool) {
        let (server, _bg) = create_test_app(pool).await;

        let response = server
            .post("/api/users")
            .text("{\"username\": truncated")
            .content_type("application/json")
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        // Malformed JSON goes through the same error shape as everything else
        let body: Value = response.json();
        assert!(body["data"]["error"].is_string());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_signup_duplicate_username(pool: PgPool) {
        let (server, _bg) = create_test_app(pool).await;

        signup(&server, "taken").await.assert_status(StatusCode::CREATED);

        let response = server
            .post("/api/users")
            .json(&json!({ "username": "taken", "email": "other@example.com", "password": "hunter2" }))
            .await;
        response.assert_status(StatusCode::CONFLICT);
        response.assert_json(&json!({ "data": { "error": "Username already taken, Please choose a different name" } }));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_signup_duplicate_email(pool: PgPool) {
        let (server, _bg) = create_test_app(pool).await;

        signup(&server, "original").await.assert_status(StatusCode::CREATED);

        let response = server
            .post("/api/users")
            .json(&json!({ "username": "different", "email": "original@example.com", "password": "hunter2" }))
            .await;
        response.assert_status(StatusCode::CONFLICT);
        response.assert_json(&json!({ "data": { "error": "Email already taken, Please choose a different email" } }));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_signup_duplicate_both_reports_username(pool: PgPool) {
        let (server, _bg) = create_test_app(pool).await;

        signup(&server, "dupe").await.assert_status(StatusCode::CREATED);

        // Username is checked before email when both collide
        let response = signup(&server, "dupe").await;
        response.assert_status(StatusCode::CONFLICT);
        response.assert_json(&json!({ "data": { "error": "Username already taken, Please choose a different name" } }));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_login_succeeds_without_email_in_body(pool: PgPool) {
        let (server, _bg) = create_test_app(pool).await;

        signup(&server, "bob").await.assert_status(StatusCode::CREATED);

        let response = server
            .post("/api/users/login")
            .json(&json!({ "email": "bob@example.com", "password": "hunter2hunter2" }))
            .await;
        response.assert_status(StatusCode::CREATED);

        let body: Value = response.json();
        assert_eq!(body["data"]["username"], "bob");
        // Login's response deliberately omits the email field
        assert!(body["data"].get("email").is_none());

        // And the minted session works
        let me = server.get("/api/users").add_header(header::COOKIE, session_cookie_pair(&response)).await;
        let me_body: Value = me.json();
        assert_eq!(me_body["data"]["username"], "bob");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_login_failures_are_indistinguishable(pool: PgPool) {
        let (server, _bg) = create_test_app(pool).await;

        signup(&server, "carol").await.assert_status(StatusCode::CREATED);

        let expected = json!({ "data": { "error": "Invalid Credentials" } });

        let unknown_email = server
            .post("/api/users/login")
            .json(&json!({ "email": "nobody@example.com", "password": "hunter2hunter2" }))
            .await;
        unknown_email.assert_status(StatusCode::UNAUTHORIZED);
        unknown_email.assert_json(&expected);

        let wrong_password = server
            .post("/api/users/login")
            .json(&json!({ "email": "carol@example.com", "password": "wrong" }))
            .await;
        wrong_password.assert_status(StatusCode::UNAUTHORIZED);
        wrong_password.assert_json(&expected);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_login_missing_fields(pool: PgPool) {
        let (server, _bg) = create_test_app(pool).await;

        let response = server.post("/api/users/login").json(&json!({ "email": "x@example.com" })).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({ "data": { "error": "Parameters missing" } }));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_logout_revokes_session_and_is_idempotent(pool: PgPool) {
        let (server, _bg) = create_test_app(pool).await;

        let signup_response = signup(&server, "dave").await;
        let cookie = session_cookie_pair(&signup_response);

        let logout = server.get("/api/users/logout").add_header(header::COOKIE, cookie.clone()).await;
        logout.assert_status_ok();
        assert!(logout.text().is_empty());

        // The response clears the cookie
        let set_cookie = logout.headers().get("set-cookie").unwrap().to_str().unwrap();
        assert!(set_cookie.contains("Max-Age=0"));

        // The revoked session no longer authenticates
        let me = server.get("/api/users").add_header(header::COOKIE, cookie.clone()).await;
        me.assert_status_ok();
        me.assert_json(&json!({ "data": null }));

        // Logging out again, with or without the stale cookie, still succeeds
        let again = server.get("/api/users/logout").add_header(header::COOKIE, cookie).await;
        again.assert_status_ok();
        let anonymous = server.get("/api/users/logout").await;
        anonymous.assert_status_ok();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_current_user_anonymous_is_null(pool: PgPool) {
        let (server, _bg) = create_test_app(pool).await;

        let response = server.get("/api/users").await;
        response.assert_status_ok();
        response.assert_json(&json!({ "data": null }));

        // A garbage cookie value is anonymous traffic, not an error
        let garbage = server
            .get("/api/users")
            .add_header(header::COOKIE, "quill_session=!!not-a-real-token!!")
            .await;
        garbage.assert_status_ok();
        garbage.assert_json(&json!({ "data": null }));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_current_user_stale_after_account_deleted(pool: PgPool) {
        let (server, _bg) = create_test_app(pool.clone()).await;

        let signup_response = signup(&server, "erin").await;
        let cookie = session_cookie_pair(&signup_response);

        // Deleting the account cascades to its sessions
        sqlx::query("DELETE FROM users WHERE username = $1")
            .bind("erin")
            .execute(&pool)
            .await
            .unwrap();

        let me = server.get("/api/users").add_header(header::COOKIE, cookie).await;
        me.assert_status_ok();
        me.assert_json(&json!({ "data": null }));
    }
}
