//! Extractors for the authenticated user resolved by the session middleware.

use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::{instrument, trace};

use crate::{
    api::models::users::CurrentUser,
    auth::middleware::AuthSession,
    errors::{Error, Result},
};

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = Error;

    #[instrument(skip(parts, _state))]
    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        match parts.extensions.get::<AuthSession>() {
            Some(auth) => Ok(auth.user.clone()),
            None => {
                trace!("No authenticated session on request");
                Err(Error::Unauthenticated { message: None })
            }
        }
    }
}

/// Extractor for routes that work with or without an authenticated session,
/// such as the current-user lookup and logout.
#[derive(Debug, Clone)]
pub struct OptionalSession(pub Option<AuthSession>);

impl<S: Send + Sync> FromRequestParts<S> for OptionalSession {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        Ok(OptionalSession(parts.extensions.get::<AuthSession>().cloned()))
    }
}
