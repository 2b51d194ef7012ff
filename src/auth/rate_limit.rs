// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Fixed-window rate limiting per client IP.
//!
//! The client is identified by the first `X-Forwarded-For` entry, then
//! `X-Real-IP`, then the literal `unknown`. Counters live in process memory;
//! stale windows are removed by the background sweeper.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::config::RateLimitConfig;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    reset_at: Instant,
}

/// Request counter keyed by client identifier.
#[derive(Debug)]
pub struct RateLimiter {
    windows: Mutex<HashMap<String, Window>>,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            max_requests: config.max_requests,
            window: config.window,
        }
    }

    /// Count a request from `client` at `now`. Returns `false` once the
    /// client has exceeded its allowance for the current window.
    pub fn check(&self, client: &str, now: Instant) -> bool {
        let Ok(mut windows) = self.windows.lock() else {
            // Counting is best effort; a poisoned lock must not take the API down.
            return true;
        };

        match windows.get_mut(client) {
            Some(entry) if now <= entry.reset_at => {
                entry.count = entry.count.saturating_add(1);
                entry.count <= self.max_requests
            }
            _ => {
                windows.insert(
                    client.to_string(),
                    Window {
                        count: 1,
                        reset_at: now + self.window,
                    },
                );
                true
            }
        }
    }

    /// Remove windows that ended before `now`. Returns how many were removed.
    pub fn purge_stale(&self, now: Instant) -> usize {
        let Ok(mut windows) = self.windows.lock() else {
            return 0;
        };
        let before = windows.len();
        windows.retain(|_, w| now <= w.reset_at);
        before - windows.len()
    }

    pub fn tracked_clients(&self) -> usize {
        self.windows.lock().map(|w| w.len()).unwrap_or(0)
    }
}

/// Identify the calling client from proxy headers.
pub fn client_ip(headers: &HeaderMap) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    let real_ip = || {
        headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    forwarded
        .or_else(real_ip)
        .unwrap_or("unknown")
        .to_string()
}

/// Middleware rejecting clients over their allowance with 429.
pub async fn rate_limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let client = client_ip(request.headers());

    if !state.rate_limiter.check(&client, Instant::now()) {
        tracing::warn!(client = %client, path = %request.uri().path(), "Rate limit exceeded");
        return ApiError::new(
            StatusCode::TOO_MANY_REQUESTS,
            "RATE_LIMITED",
            "Too many requests. Please try again later.",
        )
        .into_response();
    }

    next.run(request).await
}
