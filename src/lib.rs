//! # quill: Note-Taking Backend
//!
//! `quill` is a self-hostable backend for a personal note-taking app. It
//! provides a RESTful API for account management and per-owner note CRUD,
//! with cookie-based sessions so a browser frontend can talk to it directly.
//!
//! ## Overview
//!
//! The server owns two resources: **users** and their **notes**. Accounts are
//! created with a username, email, and password; logging in (or signing up)
//! establishes a server-side session carried by an HTTP-only cookie. Notes
//! are strictly per-owner: every note route requires a live session, and a
//! caller can only ever list, read, update, or delete their own notes.
//!
//! ### Request Flow
//!
//! Every request passes through three layers before reaching a handler. CORS
//! handles cross-origin concerns for browser clients. A fixed-window request
//! limiter counts the request against its client address and answers `429`
//! once the window's budget is spent. Session middleware then resolves the
//! session cookie against the session store exactly once: a valid token rolls
//! the session's expiry forward and attaches the authenticated user to the
//! request for handlers to pick up through extractors.
//!
//! Handlers interact with PostgreSQL through repository interfaces, and every
//! storage operation runs under a deadline so a slow database fails the
//! request instead of hanging it.
//!
//! ### Core Components
//!
//! The **API layer** ([`api`]) exposes the REST surface: account routes under
//! `/api/users` and note routes under `/api/notes`, plus interactive OpenAPI
//! documentation at `/docs`.
//!
//! The **authentication layer** ([`auth`]) generates and digests session
//! tokens, hashes passwords with Argon2, and houses the session middleware
//! and the extractors handlers use to require (or peek at) the current user.
//!
//! The **database layer** ([`db`]) uses the repository pattern to abstract
//! data access for users, notes, and sessions over a PostgreSQL pool.
//!
//! **Background services** run alongside the HTTP server: a sweeper that
//! deletes expired session rows on an interval, and a pruner that keeps the
//! request limiter's address map bounded.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use quill::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Parse CLI arguments and load configuration
//!     let args = quill::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     // Initialize telemetry (structured logging)
//!     quill::telemetry::init_telemetry()?;
//!
//!     // Create and start the application
//!     let app = Application::new(config).await?;
//!
//!     // Run with graceful shutdown on Ctrl+C
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Database Setup
//!
//! The application requires a PostgreSQL database and automatically runs
//! migrations on startup:
//!
//! ```no_run
//! # use sqlx::PgPool;
//! # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
//! // Run migrations
//! quill::migrator().run(&pool).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod limits;
mod openapi;
pub mod telemetry;
mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

use crate::config::CorsOrigin;
use crate::limits::Limiters;
use crate::openapi::ApiDoc;
use axum::http::{HeaderValue, Method, header};
use axum::{Json, Router, middleware::from_fn_with_state, routing::get, routing::post};
use bon::Builder;
pub use config::Config;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub use types::{NoteId, SessionId, UserId};

/// Application state shared across all request handlers.
///
/// This struct contains all the shared resources needed by the API handlers:
/// the database pool, the loaded configuration, and the request limiters.
///
/// # Example
///
/// ```ignore
/// let state = AppState::builder()
///     .db(pool)
///     .config(config)
///     .limiters(limiters)
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    pub limiters: Limiters,
}

/// Get the quill database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Connect the main connection pool and run migrations.
async fn setup_database(config: &Config) -> anyhow::Result<PgPool> {
    let settings = &config.database.pool;
    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(settings.idle_timeout_secs))
        .max_lifetime(Duration::from_secs(settings.max_lifetime_secs))
        .connect(&config.database.url)
        .await?;

    migrator().run(&pool).await?;

    Ok(pool)
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let mut origins = Vec::new();
    for origin in &config.cors.allowed_origins {
        let header_value = match origin {
            CorsOrigin::Wildcard => "*".parse::<HeaderValue>()?,
            CorsOrigin::Url(url) => url.as_str().parse::<HeaderValue>()?,
        };
        origins.push(header_value);
    }

    let mut exposed = Vec::new();
    for name in &config.cors.exposed_headers {
        exposed.push(name.parse::<header::HeaderName>()?);
    }

    let mut cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(config.cors.allow_credentials)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
        .expose_headers(exposed);

    if let Some(max_age) = config.cors.max_age {
        cors = cors.max_age(Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// 404 fallback for anything outside the routed surface.
async fn endpoint_not_found() -> errors::Error {
    errors::Error::NotFound {
        message: "Endpoint not found".to_string(),
    }
}

/// Build the main application router with all endpoints and middleware.
///
/// This function constructs the complete Axum router with:
/// - Account routes (sign-up, login, logout, current user)
/// - Note CRUD routes
/// - OpenAPI document and the Scalar UI
/// - Session resolution, request limiting, CORS, and tracing middleware
///
/// # Errors
///
/// Returns an error if the CORS configuration is invalid.
#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    let api_routes = Router::new()
        .route(
            "/users",
            post(api::handlers::users::sign_up).get(api::handlers::users::get_authenticated_user),
        )
        .route("/users/login", post(api::handlers::users::login))
        .route("/users/logout", get(api::handlers::users::logout))
        .route(
            "/notes",
            get(api::handlers::notes::get_notes).post(api::handlers::notes::create_note),
        )
        .route(
            "/notes/{note_id}",
            get(api::handlers::notes::get_note)
                .patch(api::handlers::notes::update_note)
                .delete(api::handlers::notes::delete_note),
        )
        .with_state(state.clone());

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .nest("/api", api_routes)
        .fallback(endpoint_not_found);

    // Layers run top-down per request: tracing, then CORS, then the request
    // limiter, then session resolution, so limited requests never touch the
    // session store and even the fallback is limited.
    let cors_layer = create_cors_layer(&state.config)?;
    let router = router
        .layer(from_fn_with_state(state.clone(), auth::middleware::session_middleware))
        .layer(from_fn_with_state(state.clone(), limits::rate_limit_middleware))
        .layer(cors_layer)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    Ok(router)
}

/// Container for background services and their lifecycle management.
///
/// This struct encapsulates the background tasks that run alongside the HTTP
/// server: the expired-session sweeper and the request limiter pruner.
///
/// # Graceful Shutdown
///
/// The struct provides a [`shutdown`](BackgroundServices::shutdown) method to
/// gracefully stop all background tasks. When dropped, the `drop_guard` will
/// automatically cancel the shutdown token, signaling all tasks to stop.
pub struct BackgroundServices {
    background_tasks: Vec<tokio::task::JoinHandle<()>>,
    shutdown_token: tokio_util::sync::CancellationToken,
    // Pub so that we can disarm it if we want to
    pub drop_guard: Option<tokio_util::sync::DropGuard>,
}

impl BackgroundServices {
    /// Gracefully shutdown all background tasks
    pub async fn shutdown(self) {
        // Signal all background tasks to shutdown
        self.shutdown_token.cancel();

        // Wait for all background tasks to complete
        for handle in self.background_tasks {
            let _ = handle.await;
        }
    }
}

/// Delete expired session rows, returning how many were swept.
async fn sweep_expired_sessions(pool: &PgPool) -> anyhow::Result<u64> {
    let mut conn = pool.acquire().await?;
    let mut session_repo = db::handlers::Sessions::new(&mut conn);
    Ok(session_repo.delete_expired().await?)
}

/// Setup background services (session sweeper, limiter pruning)
fn setup_background_services(
    pool: PgPool,
    config: &Config,
    limiters: &Limiters,
    shutdown_token: tokio_util::sync::CancellationToken,
) -> BackgroundServices {
    let drop_guard = shutdown_token.clone().drop_guard();
    // Track all background task handles for graceful shutdown
    let mut background_tasks = Vec::new();

    // Sweep expired session rows so the table only holds live sessions.
    // Expired rows are already invisible to authentication; this reclaims
    // their storage.
    let sweep_interval = config.session.sweep_interval;
    let sweeper_shutdown = shutdown_token.clone();
    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sweep_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = sweeper_shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }
            match sweep_expired_sessions(&pool).await {
                Ok(0) => {}
                Ok(swept) => info!("Swept {swept} expired sessions"),
                Err(e) => tracing::error!("Session sweep failed: {e:#}"),
            }
        }
    });
    background_tasks.push(handle);

    // Drop idle limiter windows so the per-address map stays bounded
    if let Some(limiter) = limiters.requests.clone() {
        let prune_interval = config.limits.requests.window;
        let pruner_shutdown = shutdown_token.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(prune_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = pruner_shutdown.cancelled() => break,
                    _ = ticker.tick() => {}
                }
                limiter.prune();
            }
        });
        background_tasks.push(handle);
    }

    BackgroundServices {
        background_tasks,
        shutdown_token,
        drop_guard: Some(drop_guard),
    }
}

/// Main application struct that owns all resources and lifecycle.
///
/// This is the top-level container for the entire application, managing the
/// HTTP server and routing, the database pool, the loaded configuration, and
/// the background services.
///
/// # Lifecycle
///
/// 1. **Create**: [`Application::new`] initializes all resources, runs
///    migrations, and starts background services
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and starts
///    handling requests
/// 3. **Shutdown**: when the shutdown signal resolves, gracefully stops all
///    services
pub struct Application {
    router: Router,
    config: Config,
    pool: PgPool,
    bg_services: BackgroundServices,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        Self::new_with_pool(config, None).await
    }

    /// Create an application over an existing pool, connecting (and running
    /// migrations) only when none is given. Tests hand in their own pool.
    pub async fn new_with_pool(config: Config, pool: Option<PgPool>) -> anyhow::Result<Self> {
        debug!("Starting quill with configuration: {:#?}", config);

        let pool = match pool {
            Some(pool) => pool,
            None => setup_database(&config).await?,
        };

        // Create a shutdown token for coordinating graceful shutdown of background tasks
        let shutdown_token = tokio_util::sync::CancellationToken::new();

        let limiters = Limiters::new(&config.limits);
        let bg_services = setup_background_services(pool.clone(), &config, &limiters, shutdown_token);

        // Build app state and router
        let app_state = AppState::builder().db(pool.clone()).config(config.clone()).limiters(limiters).build();

        let router = build_router(&app_state)?;

        Ok(Self {
            router,
            config,
            pool,
            bg_services,
        })
    }

    /// Convert application into a test server (for tests)
    #[cfg(any(test, feature = "test-utils"))]
    pub fn into_test_server(self) -> (axum_test::TestServer, BackgroundServices) {
        let server = axum_test::TestServer::new(self.router).expect("Failed to create test server");
        (server, self.bg_services)
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "Quill listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        // ConnectInfo gives the request limiter its client addresses
        axum::serve(listener, self.router.into_make_service_with_connect_info::<SocketAddr>())
            .with_graceful_shutdown(shutdown)
            .await?;

        // Shutdown background services and wait for tasks to complete
        self.bg_services.shutdown().await;

        // Close database connections
        info!("Closing database connections...");
        self.pool.close().await;

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use crate::test_utils::create_test_app;
    use axum::http::{StatusCode, header};
    use axum_test::{TestResponse, TestServer};
    use serde_json::{Value, json};
    use sqlx::PgPool;

    fn cookie_pair(response: &TestResponse) -> String {
        let set_cookie = response.headers().get("set-cookie").unwrap().to_str().unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }

    async fn sign_up(server: &TestServer, username: &str) -> String {
        let response = server
            .post("/api/users")
            .json(&json!({
                "username": username,
                "email": format!("{username}@example.com"),
                "password": "hunter2hunter2",
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        cookie_pair(&response)
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_healthz(pool: PgPool) {
        let (server, _bg_services) = create_test_app(pool).await;

        let response = server.get("/healthz").await;
        response.assert_status_ok();
        assert_eq!(response.text(), "OK");
    }

    /// Whole-stack walkthrough: two accounts, per-owner notes, logout gating,
    /// and re-login restoring access.
    #[sqlx::test]
    #[test_log::test]
    async fn test_full_account_and_notes_flow(pool: PgPool) {
        let (server, _bg_services) = create_test_app(pool).await;

        let alice = sign_up(&server, "alice").await;
        let bob = sign_up(&server, "bob").await;

        for (cookie, title) in [(&alice, "alice's plans"), (&bob, "bob's plans")] {
            server
                .post("/api/notes")
                .add_header(header::COOKIE, cookie.clone())
                .json(&json!({ "title": title, "text": "scheming" }))
                .await
                .assert_status(StatusCode::CREATED);
        }

        // Each account lists exactly its own note
        let alice_list = server.get("/api/notes").add_header(header::COOKIE, alice.clone()).await;
        let alice_notes: Value = alice_list.json();
        assert_eq!(alice_notes.as_array().unwrap().len(), 1);
        assert_eq!(alice_notes[0]["title"], "alice's plans");

        // Logout gates the note routes for alice and only alice
        server
            .get("/api/users/logout")
            .add_header(header::COOKIE, alice.clone())
            .await
            .assert_status_ok();

        let gated = server.get("/api/notes").add_header(header::COOKIE, alice).await;
        gated.assert_status(StatusCode::UNAUTHORIZED);
        gated.assert_json(&json!({ "data": { "error": "User not authenticated" } }));

        let bob_list = server.get("/api/notes").add_header(header::COOKIE, bob).await;
        bob_list.assert_status_ok();
        let bob_notes: Value = bob_list.json();
        assert_eq!(bob_notes[0]["title"], "bob's plans");

        // Logging back in mints a fresh session with the same notes behind it
        let login = server
            .post("/api/users/login")
            .json(&json!({ "email": "alice@example.com", "password": "hunter2hunter2" }))
            .await;
        login.assert_status(StatusCode::CREATED);

        let relisted = server.get("/api/notes").add_header(header::COOKIE, cookie_pair(&login)).await;
        relisted.assert_status_ok();
        let relisted_notes: Value = relisted.json();
        assert_eq!(relisted_notes[0]["title"], "alice's plans");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_unknown_routes_get_the_enveloped_404(pool: PgPool) {
        let (server, _bg_services) = create_test_app(pool).await;

        let expected = json!({ "data": { "error": "Endpoint not found" } });

        let outside = server.get("/definitely/not/here").await;
        outside.assert_status(StatusCode::NOT_FOUND);
        outside.assert_json(&expected);

        // Unmatched paths under /api fall through to the same fallback
        let under_api = server.get("/api/unknown").await;
        under_api.assert_status(StatusCode::NOT_FOUND);
        under_api.assert_json(&expected);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_openapi_document_is_served(pool: PgPool) {
        let (server, _bg_services) = create_test_app(pool).await;

        let response = server.get("/api-docs/openapi.json").await;
        response.assert_status_ok();

        let body: serde_json::Value = response.json();
        assert_eq!(body["info"]["title"], "Quill API");
        assert!(body["paths"]["/api/notes"].is_object());
        assert!(body["paths"]["/api/users/login"].is_object());
    }
}
