use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, header},
    middleware::Next,
    response::Response,
};
use tracing::{debug, trace};

use crate::{
    AppState,
    api::models::users::CurrentUser,
    auth::session,
    db::{errors::DbError, handlers::Sessions, models::sessions::AuthSessionDBResponse, with_timeout},
    errors::Error,
    types::SessionId,
};

/// Authenticated session attached to the request by [`session_middleware`].
///
/// Handlers read this through the [`CurrentUser`] and
/// [`OptionalSession`](crate::auth::current_user::OptionalSession) extractors
/// rather than touching the session store themselves.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub session_id: SessionId,
    pub user: CurrentUser,
}

impl From<AuthSessionDBResponse> for AuthSession {
    fn from(row: AuthSessionDBResponse) -> Self {
        Self {
            session_id: row.id,
            user: CurrentUser {
                id: row.user_id,
                username: row.username,
                email: row.email,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
        }
    }
}

/// Implementation for session_middleware. Resolves the session cookie against
/// the session store exactly once per request.
///
/// Returns the authenticated session plus the refreshed cookie to attach to
/// the response, or None when the request carries no live session. A missing,
/// unknown, expired, or tampered token is anonymous traffic, never an error;
/// only session store failures propagate.
pub(crate) async fn authenticate_request(state: &AppState, headers: &HeaderMap) -> Result<Option<(AuthSession, String)>, Error> {
    let Some(token) = session::token_from_headers(headers, &state.config.session.cookie_name) else {
        trace!("No session cookie on request");
        return Ok(None);
    };

    let digest = session::digest_session_token(&token, &state.config)?;
    let timeout = state.config.session.timeout;

    let refreshed = with_timeout(state.config.op_timeout, "refresh session", async {
        let mut conn = state.db.acquire().await.map_err(DbError::from)?;
        let mut session_repo = Sessions::new(&mut conn);
        session_repo.touch(&digest, timeout).await
    })
    .await?;

    match refreshed {
        Some(row) => {
            debug!("Found session authenticated user: {}", row.user_id);
            let cookie = session::session_cookie(&token, &state.config);
            Ok(Some((AuthSession::from(row), cookie)))
        }
        None => {
            trace!("Session cookie did not match a live session");
            Ok(None)
        }
    }
}

/// Middleware that resolves the session cookie ahead of routing and rolls the
/// session lifetime on every authenticated request.
pub async fn session_middleware(State(state): State<AppState>, mut request: Request, next: Next) -> Result<Response, Error> {
    let refreshed_cookie = match authenticate_request(&state, request.headers()).await? {
        Some((auth, cookie)) => {
            request.extensions_mut().insert(auth);
            Some(cookie)
        }
        None => None,
    };

    let mut response = next.run(request).await;

    // Roll the cookie lifetime on authenticated traffic, but never clobber a
    // cookie the handler itself set (signup, login, logout).
    if let Some(cookie) = refreshed_cookie {
        if !response.headers().contains_key(header::SET_COOKIE) {
            if let Ok(value) = HeaderValue::from_str(&cookie) {
                response.headers_mut().insert(header::SET_COOKIE, value);
            }
        }
    }

    Ok(response)
}
