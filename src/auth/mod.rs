//! Authentication system.
//!
//! This module implements cookie-based session authentication:
//! - Users sign up via `POST /api/users` and log in via
//!   `POST /api/users/login` with email/password credentials
//! - An opaque session token is stored in an HTTP-only cookie; only a keyed
//!   digest of it is persisted server-side
//! - Sessions roll: every authenticated request pushes the expiry forward by
//!   the configured timeout
//! - Logout deletes the server-side session row and expires the cookie
//!
//! # Modules
//!
//! - [`current_user`]: Extractors for getting the authenticated user in handlers
//! - [`middleware`]: Session resolution ahead of routing
//! - [`password`]: Password hashing and verification using Argon2
//! - [`session`]: Session token generation, digests, and cookie formatting
//!
//! # Usage in Handlers
//!
//! ```ignore
//! use quill::api::models::users::CurrentUser;
//!
//! async fn protected_handler(user: CurrentUser) -> Result<String, Error> {
//!     Ok(format!("Hello, {}!", user.username))
//! }
//! ```

pub mod current_user;
pub mod middleware;
pub mod password;
pub mod session;
