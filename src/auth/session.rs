//! Opaque session token primitives.
//!
//! A session token is 256 bits of CSPRNG output, base64url-encoded, and
//! travels only in an HTTP-only cookie. The server persists a keyed SHA-256
//! digest of the token rather than the token itself, so a leaked sessions
//! table cannot be replayed against the API.

use axum::http::HeaderMap;
use base64::{Engine as _, engine::general_purpose};
use rand::{Rng, thread_rng};
use sha2::{Digest, Sha256};

use crate::config::Config;
use crate::errors::Error;

/// Generate a new session token with 256 bits of entropy.
pub fn generate_session_token() -> String {
    // 32 bytes (256 bits) of cryptographically secure random data
    let mut token_bytes = [0u8; 32];
    thread_rng().fill(&mut token_bytes);

    general_purpose::URL_SAFE_NO_PAD.encode(token_bytes)
}

/// Compute the keyed digest of a session token as stored in the sessions
/// table.
///
/// The digest is SHA-256 over `secret_key || token`, base64url-encoded. Keying
/// with the server secret means digests are only comparable by a party that
/// holds the secret.
pub fn digest_session_token(token: &str, config: &Config) -> Result<String, Error> {
    let secret_key = config.secret_key.as_deref().ok_or_else(|| Error::Internal {
        operation: "digest session token: secret_key is not configured".to_string(),
    })?;

    let mut hasher = Sha256::new();
    hasher.update(secret_key.as_bytes());
    hasher.update(token.as_bytes());
    let digest = hasher.finalize();

    Ok(general_purpose::URL_SAFE_NO_PAD.encode(digest))
}

/// Format the session cookie attached to signup/login responses and refreshed
/// on every authenticated request.
pub fn session_cookie(token: &str, config: &Config) -> String {
    let session_config = &config.session;
    let max_age = session_config.timeout.as_secs();

    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite={}; Max-Age={}",
        session_config.cookie_name,
        token,
        same_site_attr(&session_config.cookie_same_site),
        max_age
    );
    if session_config.cookie_secure {
        cookie.push_str("; Secure");
    }

    cookie
}

/// Format an expired session cookie so the browser drops its token on logout.
pub fn clear_session_cookie(config: &Config) -> String {
    let session_config = &config.session;

    let mut cookie = format!(
        "{}=; Path=/; HttpOnly; SameSite={}; Max-Age=0",
        session_config.cookie_name,
        same_site_attr(&session_config.cookie_same_site)
    );
    if session_config.cookie_secure {
        cookie.push_str("; Secure");
    }

    cookie
}

// Config validation restricts cookie_same_site to strict/lax/none.
fn same_site_attr(value: &str) -> &'static str {
    match value {
        "strict" => "Strict",
        "none" => "None",
        _ => "Lax",
    }
}

/// Pull the raw session token out of the request's Cookie header, if present.
pub fn token_from_headers(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let cookie_header = headers.get(axum::http::header::COOKIE)?;
    let cookie_str = cookie_header.to_str().ok()?;

    for cookie in cookie_str.split(';') {
        let cookie = cookie.trim();
        if let Some((name, value)) = cookie.split_once('=') {
            if name == cookie_name {
                return Some(value.to_string());
            }
        }
    }

    None
}
