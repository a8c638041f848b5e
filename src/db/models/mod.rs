//! Database record models matching table schemas.
//!
//! This module contains struct definitions that directly correspond to database
//! table rows. These models are used by repositories to return query results
//! and accept insertion/update data.
//!
//! # Design Principles
//!
//! - **Schema Mapping**: Each model struct matches a database table schema
//! - **SQLx Integration**: Response models derive `sqlx::FromRow` for query results
//! - **Separation**: Database models are distinct from API models to allow
//!   independent evolution of storage and API representations
//!
//! # Model Categories
//!
//! - [`users`]: User accounts and credentials
//! - [`notes`]: Per-user note records
//! - [`sessions`]: Server-side session records (keyed token digests)
//!
//! # Conversion to API Models
//!
//! Database models typically implement `From` conversions to API models:
//!
//! ```ignore
//! use quill::db::models::users::UserDBResponse;
//! use quill::api::models::users::UserResponse;
//!
//! let db_user: UserDBResponse = /* ... */;
//! let api_response = UserResponse::from(db_user);
//! ```

pub mod notes;
pub mod sessions;
pub mod users;
