//! API request/response models for users.

use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::models::Data;
use crate::db::models::users::UserDBResponse;
use crate::types::UserId;

// User request models
//
// Credential fields deserialize as optional so handlers can answer absent
// input with the canonical "Parameters missing" message rather than a serde
// rejection.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SignupRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

// User response models

/// Account details including the private email.
///
/// Returned from signup and the current-user lookup; the password hash never
/// leaves the database layer.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Account details as returned from login, which does not echo the email
/// back.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginUserResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The authenticated user, extracted from the request's resolved session.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CurrentUser {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserDBResponse> for UserResponse {
    fn from(db: UserDBResponse) -> Self {
        Self {
            id: db.id,
            username: db.username,
            email: db.email,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

impl From<UserDBResponse> for LoginUserResponse {
    fn from(db: UserDBResponse) -> Self {
        Self {
            id: db.id,
            username: db.username,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

impl From<CurrentUser> for UserResponse {
    fn from(user: CurrentUser) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Response for signup: the created user plus the fresh session cookie.
#[derive(Debug)]
pub struct SignupResponse {
    pub user: UserResponse,
    pub cookie: String,
}

impl IntoResponse for SignupResponse {
    fn into_response(self) -> Response {
        (
            StatusCode::CREATED,
            [(header::SET_COOKIE, self.cookie)],
            Json(Data::new(self.user)),
        )
            .into_response()
    }
}

/// Response for login: the user (without email) plus the fresh session cookie.
#[derive(Debug)]
pub struct LoginResponse {
    pub user: LoginUserResponse,
    pub cookie: String,
}

impl IntoResponse for LoginResponse {
    fn into_response(self) -> Response {
        (
            StatusCode::CREATED,
            [(header::SET_COOKIE, self.cookie)],
            Json(Data::new(self.user)),
        )
            .into_response()
    }
}

/// Response for logout: no body, expired session cookie.
#[derive(Debug)]
pub struct LogoutResponse {
    pub cookie: String,
}

impl IntoResponse for LogoutResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, [(header::SET_COOKIE, self.cookie)]).into_response()
    }
}
