//! Test utilities for integration testing (available with `test-utils` feature).

use crate::config::{Config, LimitsConfig, PasswordConfig, PoolSettings, RequestLimitsConfig};
use crate::limits::Limiters;
use axum_test::TestServer;
use sqlx::PgPool;

pub async fn create_test_app(pool: PgPool) -> (TestServer, crate::BackgroundServices) {
    let config = create_test_config();

    let app = crate::Application::new_with_pool(config, Some(pool))
        .await
        .expect("Failed to create application");

    app.into_test_server()
}

pub fn create_test_config() -> Config {
    Config {
        database_url: None,
        database: crate::config::DatabaseConfig {
            // Unused: tests hand in their own pool
            url: "postgres://unused".to_string(),
            pool: PoolSettings {
                max_connections: 1,
                min_connections: 1,
                ..Default::default()
            },
        },
        host: "127.0.0.1".to_string(),
        port: 0,
        secret_key: Some("test-secret-key-for-testing-only".to_string()),
        session: crate::config::SessionConfig::default(),
        password: PasswordConfig {
            // Minimal Argon2 cost so tests that hash stay fast
            argon2_memory_kib: 1024,
            argon2_iterations: 1,
            argon2_parallelism: 1,
        },
        cors: crate::config::CorsConfig::default(),
        limits: LimitsConfig {
            // Handler tests fire many requests; limiter tests enable this themselves
            requests: RequestLimitsConfig {
                enabled: false,
                ..Default::default()
            },
        },
        op_timeout: std::time::Duration::from_secs(5),
    }
}

/// Build an [`AppState`](crate::AppState) over a test pool, for exercising
/// middleware and extractors without a full application.
pub fn create_test_state(pool: PgPool) -> crate::AppState {
    let config = create_test_config();
    let limiters = Limiters::new(&config.limits);
    crate::AppState::builder().db(pool).config(config).limiters(limiters).build()
}
