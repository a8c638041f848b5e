//! Repository implementations for database access.
//!
//! This module provides repository structs for each major entity in the system.
//! Repositories follow a consistent pattern and implement the [`Repository`] trait.
//!
//! # Design Pattern
//!
//! Each repository:
//! - Wraps a SQLx connection or transaction
//! - Provides strongly-typed CRUD operations
//! - Handles query construction and parameter binding
//! - Returns domain models from [`crate::db::models`]
//!
//! # Available Repositories
//!
//! - [`Users`]: User account management and credential lookups
//! - [`Notes`]: Per-user note records
//! - [`Sessions`]: Server-side session lifecycle (not on the trait; its hot
//!   path is the single-statement rolling refresh)
//!
//! # Common Pattern
//!
//! All repositories follow this usage pattern:
//!
//! ```ignore
//! use quill::db::handlers::{Repository, Users};
//!
//! async fn example(pool: &sqlx::PgPool) -> Result<(), Box<dyn std::error::Error>> {
//!     let mut conn = pool.acquire().await?;
//!     let mut repo = Users::new(&mut conn);
//!
//!     let user = repo.get_user_by_email("user@example.com").await?;
//!     Ok(())
//! }
//! ```
//!
//! # The Repository Trait
//!
//! The [`Repository`] trait defines common CRUD operations that all repositories
//! should implement:
//!
//! - `new()`: Create a new repository instance
//! - `create()`: Insert a new record
//! - `get_by_id()`: Fetch a record by ID
//! - `list()`: List records matching a filter
//! - `delete()`: Delete a record by ID
//! - `update()`: Update a record by ID

pub mod notes;
pub mod repository;
pub mod sessions;
pub mod users;

pub use notes::Notes;
pub use repository::Repository;
pub use sessions::Sessions;
pub use users::Users;
