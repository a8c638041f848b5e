//! Resource limiting for protecting system capacity.
//!
//! This module provides the fixed-window request limiter that fronts every
//! route, including the docs and the 404 fallback.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use dashmap::DashMap;

use crate::AppState;
use crate::config::{LimitsConfig, RequestLimitsConfig};
use crate::errors::{Error, Result};

/// Container for all resource limiters.
///
/// This struct holds all the individual limiters used by the application.
/// Add new limiters here as fields when implementing additional rate limiting.
#[derive(Debug, Default, Clone)]
pub struct Limiters {
    /// Per-client request limiter. None means unlimited.
    pub requests: Option<Arc<RequestLimiter>>,
}

impl Limiters {
    /// Creates all limiters from configuration.
    pub fn new(config: &LimitsConfig) -> Self {
        Self {
            requests: RequestLimiter::new(&config.requests).map(Arc::new),
        }
    }
}

/// Per-window request counter for one client address.
#[derive(Debug)]
struct Window {
    started_at: Instant,
    count: usize,
}

/// Fixed-window request limiter keyed by client IP.
///
/// Each client gets `max_requests` per `window`; the first request after a
/// window elapses resets its count. Windows live in a concurrent map, so the
/// limiter is shared across handlers without a global lock.
#[derive(Debug)]
pub struct RequestLimiter {
    windows: DashMap<IpAddr, Window>,
    window: Duration,
    max_requests: usize,
}

impl RequestLimiter {
    /// Creates a request limiter from configuration.
    ///
    /// Returns `None` when limiting is disabled.
    pub fn new(config: &RequestLimitsConfig) -> Option<Self> {
        if !config.enabled {
            return None;
        }

        Some(Self {
            windows: DashMap::new(),
            window: config.window,
            max_requests: config.max_requests,
        })
    }

    /// Count one request from `addr` against its current window.
    ///
    /// Returns `Err(TooManyRequests)` once the window's budget is spent: with
    /// a limit of 100, the 101st request inside a window is the first
    /// rejected one.
    pub fn check(&self, addr: IpAddr) -> Result<()> {
        let now = Instant::now();
        let mut window = self.windows.entry(addr).or_insert_with(|| Window { started_at: now, count: 0 });

        if now.duration_since(window.started_at) >= self.window {
            window.started_at = now;
            window.count = 0;
        }

        window.count += 1;
        if window.count > self.max_requests {
            return Err(Error::TooManyRequests {
                message: "Too many requests, please try again later.".to_string(),
            });
        }

        Ok(())
    }

    /// Drop windows that have aged past the period, so the map does not keep
    /// one entry per address ever seen.
    pub fn prune(&self) {
        let now = Instant::now();
        self.windows.retain(|_, window| now.duration_since(window.started_at) < self.window);
    }

    /// Number of addresses currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }
}

/// Middleware applying the request limiter ahead of every route.
///
/// The client address comes from `ConnectInfo`; requests without one (an
/// in-process test server, for instance) fall back to localhost so they are
/// still counted.
pub async fn rate_limit_middleware(State(state): State<AppState>, request: Request, next: Next) -> Result<Response> {
    if let Some(limiter) = state.limiters.requests.as_ref() {
        let addr = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|info| info.0.ip())
            .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));

        limiter.check(addr)?;
    }

    Ok(next.run(request).await)
}
