//! API layer for HTTP request handling and data models.
//!
//! This module contains the REST API implementation, organized into:
//!
//! - **[`handlers`]**: Axum route handlers for all API endpoints
//! - **[`models`]**: Request/response data structures for API communication
//!
//! # API Structure
//!
//! The API has two functional areas:
//!
//! - **Users** (`/api/users`, `/api/users/login`, `/api/users/logout`):
//!   account lifecycle and session management
//! - **Notes** (`/api/notes`, `/api/notes/{note_id}`): per-owner note CRUD
//!
//! # OpenAPI Documentation
//!
//! All endpoints are documented with OpenAPI annotations using `utoipa`.
//! Interactive documentation is served at `/docs` when the server is running.

pub mod handlers;
pub mod models;
