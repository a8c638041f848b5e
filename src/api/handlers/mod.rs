//! HTTP request handlers for all API endpoints.
//!
//! This module contains Axum route handlers organized by resource type.
//! Each handler is responsible for:
//! - Request validation and deserialization
//! - Authentication and authorization checks
//! - Business logic execution via database repositories
//! - Response serialization
//!
//! # Handler Modules
//!
//! - [`users`]: Account sign-up, login, logout, and the current-user endpoint
//! - [`notes`]: Note CRUD, scoped to the authenticated owner
//!
//! # Authentication
//!
//! Session resolution happens in [`crate::auth::middleware`] before routing;
//! handlers declare their auth requirements through the
//! [`crate::api::models::users::CurrentUser`] and
//! [`crate::auth::current_user::OptionalSession`] extractors.
//!
//! # Error Handling
//!
//! Handlers return [`crate::errors::Error`] which automatically converts to
//! appropriate HTTP status codes and JSON error responses.

pub mod notes;
pub mod users;
