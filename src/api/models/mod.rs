//! API request and response data models.
//!
//! This module contains the data structures used for HTTP request deserialization
//! and response serialization. These models define the public API contract.
//!
//! # Design Principles
//!
//! - **Separation of Concerns**: API models are distinct from database models,
//!   allowing independent evolution of API and storage representations
//! - **Validation**: Models use serde for deserialization; content validation
//!   (required fields, exact error messages) lives in the handlers
//! - **OpenAPI**: All models are annotated with `utoipa` for automatic API docs
//!
//! # Model Categories
//!
//! - [`users`]: Signup/login payloads, user responses, and session-cookie
//!   bearing response types
//! - [`notes`]: Note create/update payloads and responses
//!
//! # Response Envelope
//!
//! Success bodies are wrapped as `{"data": ...}` via [`Data`], with one
//! deliberate exception: the note listing returns a bare array. Error bodies
//! are shaped by [`crate::errors::Error`] as `{"data": {"error": ...}}`.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod notes;
pub mod users;

/// Standard `{"data": ...}` envelope for success responses.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Data<T> {
    pub data: T,
}

impl<T> Data<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}
