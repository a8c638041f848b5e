//! Database layer for data persistence and access.
//!
//! This module implements the data access layer using SQLx with PostgreSQL.
//! It follows the Repository pattern to provide clean abstractions over database operations.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  (API request handlers)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │ Repositories│  (db::handlers - queries & row mapping)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │   Models    │  (db::models - database records)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │  PostgreSQL │
//! └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`handlers`]: Repository implementations for CRUD operations
//! - [`models`]: Database record structures matching table schemas
//! - [`errors`]: Database-specific error types
//!
//! # Repository Pattern
//!
//! The [`handlers`] module provides repository structs for each database
//! table. Repositories encapsulate all database access for a specific entity
//! type and borrow a connection (or transaction) for their lifetime:
//!
//! ```ignore
//! use quill::db::handlers::{Notes, Repository};
//!
//! async fn example(pool: &sqlx::PgPool) -> Result<(), Box<dyn std::error::Error>> {
//!     let mut conn = pool.acquire().await?;
//!     let mut notes_repo = Notes::new(&mut conn);
//!
//!     if let Some(note) = notes_repo.get_by_id(note_id).await? {
//!         println!("Found note: {}", note.title);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Migrations
//!
//! Database migrations are managed by SQLx and located in the `migrations/`
//! directory. The [`crate::migrator`] function provides access to the
//! migrator:
//!
//! ```ignore
//! quill::migrator().run(&pool).await?;
//! ```

use std::future::Future;
use std::time::Duration;

use crate::errors::Error;

pub mod errors;
pub mod handlers;
pub mod models;

/// Run a storage operation under a deadline.
///
/// An elapsed deadline surfaces as [`Error::StoreTimeout`] carrying the
/// operation name; the operation's connection is dropped with its future.
pub async fn with_timeout<T, E, F>(deadline: Duration, operation: &str, fut: F) -> Result<T, Error>
where
    F: Future<Output = std::result::Result<T, E>>,
    Error: From<E>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result.map_err(Error::from),
        Err(_) => Err(Error::StoreTimeout {
            operation: operation.to_string(),
        }),
    }
}
