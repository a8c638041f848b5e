//! Application configuration.
//!
//! Configuration is layered: a YAML file (path from `--config` / `QUILL_CONFIG`)
//! merged with `QUILL_`-prefixed environment variables (`__` separates nesting,
//! e.g. `QUILL_SESSION__COOKIE_NAME`), plus the conventional `DATABASE_URL`.
//!
//! Every section has serde defaults so a minimal config file only needs the
//! values without safe defaults (`secret_key`, `database.url`).

use clap::Parser;
use figment::{
    providers::{Env, Format, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::errors::Error;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the configuration file
    #[arg(short = 'f', long, env = "QUILL_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate the configuration and exit without serving
    #[arg(long)]
    pub validate: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Host address to bind to (default: 0.0.0.0)
    pub host: String,
    /// Port to listen on (default: 3001)
    pub port: u16,
    /// Secret key for keying session token digests. Required.
    pub secret_key: Option<String>,
    /// Populated from the DATABASE_URL environment variable; folded into
    /// `database.url` during load.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,
    /// Database connection settings
    pub database: DatabaseConfig,
    /// Session cookie and lifetime settings
    pub session: SessionConfig,
    /// Password hashing settings
    pub password: PasswordConfig,
    /// Cross-origin resource sharing settings
    pub cors: CorsConfig,
    /// Request limiting settings
    pub limits: LimitsConfig,
    /// Deadline for individual storage operations; operations that exceed it
    /// fail the request instead of hanging it
    #[serde(with = "humantime_serde")]
    pub op_timeout: Duration,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Postgres connection string
    pub url: String,
    /// Connection pool settings
    pub pool: PoolSettings,
}

/// Database connection pool settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PoolSettings {
    /// Maximum number of connections in the pool (default: 10)
    pub max_connections: u32,
    /// Minimum number of idle connections to maintain (default: 0)
    pub min_connections: u32,
    /// Timeout for acquiring a connection in seconds (default: 30)
    pub acquire_timeout_secs: u64,
    /// How long a connection can be idle before being closed in seconds (default: 600)
    pub idle_timeout_secs: u64,
    /// Maximum lifetime of a connection in seconds (default: 1800)
    pub max_lifetime_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Rolling session lifetime; every authenticated request renews it
    /// (default: 5 days)
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    /// Name of the session cookie (default: quill_session)
    pub cookie_name: String,
    /// Whether to set the Secure attribute on the session cookie
    /// (default: false, for plain-HTTP development)
    pub cookie_secure: bool,
    /// SameSite attribute for the session cookie: strict, lax, or none
    /// (default: lax)
    pub cookie_same_site: String,
    /// How often expired session rows are swept from storage (default: 1 hour)
    #[serde(with = "humantime_serde")]
    pub sweep_interval: Duration,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PasswordConfig {
    /// Argon2 memory cost in KiB (default: 19456 = 19 MiB)
    pub argon2_memory_kib: u32,
    /// Argon2 iteration count (default: 2)
    pub argon2_iterations: u32,
    /// Argon2 parallelism degree (default: 1)
    pub argon2_parallelism: u32,
}

/// CORS configuration for the HTTP API
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    /// List of allowed origins. Can include specific URLs or "*" for all origins.
    pub allowed_origins: Vec<CorsOrigin>,
    /// Whether to allow credentials (cookies). Required for session auth from
    /// a browser frontend.
    pub allow_credentials: bool,
    /// Max age for preflight cache in seconds
    pub max_age: Option<u64>,
    /// Headers exposed to the browser
    pub exposed_headers: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsConfig {
    /// Fixed-window request limiting, applied per client address
    pub requests: RequestLimitsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RequestLimitsConfig {
    /// Whether request limiting is enabled (default: true)
    pub enabled: bool,
    /// Length of the fixed window (default: 15 minutes)
    #[serde(with = "humantime_serde")]
    pub window: Duration,
    /// Requests allowed per client per window (default: 100)
    pub max_requests: usize,
}

/// An allowed CORS origin: either a wildcard (`*`) or a specific URL.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CorsOrigin {
    /// Allow all origins (`*`)
    #[serde(deserialize_with = "parse_wildcard")]
    Wildcard,
    /// Specific origin URL (e.g., `https://app.example.com`)
    #[serde(deserialize_with = "parse_url")]
    Url(Url),
}

fn parse_wildcard<'de, D>(deserializer: D) -> Result<(), D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    if s == "*" {
        Ok(())
    } else {
        Err(serde::de::Error::custom("Expected '*'"))
    }
}

fn parse_url<'de, D>(deserializer: D) -> Result<Url, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    Url::parse(&s).map_err(serde::de::Error::custom)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            secret_key: None,
            database_url: None,
            database: DatabaseConfig::default(),
            session: SessionConfig::default(),
            password: PasswordConfig::default(),
            cors: CorsConfig::default(),
            limits: LimitsConfig::default(),
            op_timeout: Duration::from_secs(5),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            pool: PoolSettings::default(),
        }
    }
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 0,
            acquire_timeout_secs: 30,
            idle_timeout_secs: 600,
            max_lifetime_secs: 1800,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5 * 24 * 60 * 60), // 5 days
            cookie_name: "quill_session".to_string(),
            cookie_secure: false,
            cookie_same_site: "lax".to_string(),
            sweep_interval: Duration::from_secs(60 * 60), // 1 hour
        }
    }
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            // Secure defaults for production (Argon2id RFC recommendations)
            argon2_memory_kib: 19456, // 19 MB
            argon2_iterations: 2,
            argon2_parallelism: 1,
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                CorsOrigin::Url(Url::parse("http://localhost:5173").unwrap()), // Development frontend (Vite)
            ],
            allow_credentials: true,
            max_age: Some(3600), // Cache preflight for 1 hour
            exposed_headers: vec![],
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            requests: RequestLimitsConfig::default(),
        }
    }
}

impl Default for RequestLimitsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window: Duration::from_secs(15 * 60), // 15 minutes
            max_requests: 100,
        }
    }
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let mut config: Self = Self::figment(args).extract()?;

        // DATABASE_URL takes precedence over the config file, preserving pool settings
        if let Some(url) = config.database_url.take() {
            config.database.url = url;
        }

        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            // Load base config file
            .merge(Yaml::file(&args.config))
            // Environment variables can still override specific values
            .merge(Env::prefixed("QUILL_").split("__"))
            // Common DATABASE_URL pattern
            .merge(Env::raw().only(&["DATABASE_URL"]))
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), Error> {
        if self.secret_key.is_none() {
            return Err(Error::Internal {
                operation: "Config validation: secret_key is not configured. \
                     Please set QUILL_SECRET_KEY environment variable or add secret_key to config file."
                    .to_string(),
            });
        }

        if self.database.url.is_empty() {
            return Err(Error::Internal {
                operation: "Config validation: database.url is not configured. \
                     Please set DATABASE_URL environment variable or add database.url to config file."
                    .to_string(),
            });
        }

        if self.session.timeout.is_zero() {
            return Err(Error::Internal {
                operation: "Config validation: session.timeout must be greater than zero.".to_string(),
            });
        }

        if self.session.sweep_interval.is_zero() {
            return Err(Error::Internal {
                operation: "Config validation: session.sweep_interval must be greater than zero.".to_string(),
            });
        }

        if !matches!(self.session.cookie_same_site.as_str(), "strict" | "lax" | "none") {
            return Err(Error::Internal {
                operation: format!(
                    "Config validation: session.cookie_same_site must be one of strict, lax, none (got '{}')",
                    self.session.cookie_same_site
                ),
            });
        }

        if self.op_timeout.is_zero() {
            return Err(Error::Internal {
                operation: "Config validation: op_timeout must be greater than zero.".to_string(),
            });
        }

        // Validate CORS configuration
        if self.cors.allowed_origins.is_empty() {
            return Err(Error::Internal {
                operation: "Config validation: CORS allowed_origins cannot be empty. Add at least one allowed origin.".to_string(),
            });
        }

        // Validate that wildcard is not used with credentials
        let has_wildcard = self.cors.allowed_origins.iter().any(|origin| matches!(origin, CorsOrigin::Wildcard));
        if has_wildcard && self.cors.allow_credentials {
            return Err(Error::Internal {
                operation: "Config validation: CORS cannot use wildcard origin '*' with allow_credentials=true. Specify explicit origins."
                    .to_string(),
            });
        }

        // Validate request limiting configuration
        if self.limits.requests.enabled {
            if self.limits.requests.window.is_zero() {
                return Err(Error::Internal {
                    operation: "Config validation: limits.requests.window must be greater than zero when limiting is enabled."
                        .to_string(),
                });
            }
            if self.limits.requests.max_requests == 0 {
                return Err(Error::Internal {
                    operation: "Config validation: limits.requests.max_requests must be greater than zero when limiting is enabled. \
                               Set enabled: false to disable limiting."
                        .to_string(),
                });
            }
        }

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
