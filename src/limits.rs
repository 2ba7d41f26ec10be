//! Per-caller request rate limiting.
//!
//! A fixed-window counter keyed by caller identity (API key secret when
//! present, otherwise client IP), held in a concurrent map. Expired windows
//! are swept whenever the map grows past a threshold, so the map stays
//! bounded even under a churning key population.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use dashmap::DashMap;

use crate::{errors::Error, AppState};

const WINDOW: Duration = Duration::from_secs(60);

/// Sweep expired windows once the map holds this many entries.
const SWEEP_THRESHOLD: usize = 10_000;

#[derive(Debug)]
struct Window {
    started: Instant,
    count: u32,
}

/// Fixed-window rate limiter over a concurrent map.
#[derive(Debug, Default)]
pub struct RateLimiter {
    windows: DashMap<String, Window>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one request for `key`. Returns false when the caller has
    /// exhausted its budget for the current window.
    pub fn check(&self, key: &str, limit: u32) -> bool {
        let now = Instant::now();

        let allowed = {
            let mut window = self.windows.entry(key.to_string()).or_insert(Window { started: now, count: 0 });
            if now.duration_since(window.started) >= WINDOW {
                window.started = now;
                window.count = 0;
            }
            window.count += 1;
            window.count <= limit
        };

        if self.windows.len() > SWEEP_THRESHOLD {
            self.sweep(now);
        }

        allowed
    }

    fn sweep(&self, now: Instant) {
        self.windows.retain(|_, window| now.duration_since(window.started) < WINDOW);
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.windows.len()
    }
}

/// Axum middleware applying the configured per-caller limit.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Result<Response, Error> {
    if !state.config.rate_limit.enabled {
        return Ok(next.run(request).await);
    }

    // Keyed by bearer credential when present so callers behind one NAT
    // don't share a budget; otherwise by client IP.
    let key = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::to_string)
        .unwrap_or_else(|| addr.ip().to_string());

    if !state.rate_limiter.check(&key, state.config.rate_limit.requests_per_minute) {
        return Err(Error::RateLimited);
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_the_limit_then_rejects() {
        let limiter = RateLimiter::new();
        for _ in 0..5 {
            assert!(limiter.check("caller", 5));
        }
        assert!(!limiter.check("caller", 5));
    }

    #[test]
    fn keys_have_independent_budgets() {
        let limiter = RateLimiter::new();
        assert!(limiter.check("a", 1));
        assert!(!limiter.check("a", 1));
        assert!(limiter.check("b", 1));
    }

    #[test]
    fn sweep_drops_expired_windows() {
        let limiter = RateLimiter::new();
        limiter.check("stale", 10);
        limiter.check("fresh", 10);

        // Age out one entry by hand.
        limiter.windows.get_mut("stale").unwrap().started = Instant::now() - WINDOW * 2;
        limiter.sweep(Instant::now());

        assert_eq!(limiter.len(), 1);
        assert!(limiter.windows.contains_key("fresh"));
    }
}
