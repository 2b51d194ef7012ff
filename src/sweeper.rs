// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Expiry Sweeper
//!
//! Background task that keeps the in-memory security state bounded. Every
//! `interval` (the signature window by default) it:
//! 1. Drops replay entries whose expiry has passed.
//! 2. Drops rate-limit windows that have ended.
//!
//! Expired entries are already treated as absent by the stores; the sweep
//! only reclaims memory.
//!
//! ## Shutdown
//!
//! Uses `tokio_util::sync::CancellationToken` for graceful shutdown.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::auth::{RateLimiter, ReplayStore};

pub struct Sweeper {
    replay: Arc<dyn ReplayStore>,
    rate_limiter: Arc<RateLimiter>,
    interval: Duration,
}

impl Sweeper {
    pub fn new(replay: Arc<dyn ReplayStore>, rate_limiter: Arc<RateLimiter>, interval: Duration) -> Self {
        Self {
            replay,
            rate_limiter,
            interval,
        }
    }

    /// Run the sweep loop until the cancellation token is triggered.
    ///
    /// ```rust,ignore
    /// tokio::spawn(sweeper.run(shutdown.clone()));
    /// ```
    pub async fn run(self, shutdown: CancellationToken) {
        info!(interval_secs = self.interval.as_secs(), "Expiry sweeper starting");

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {},
                _ = shutdown.cancelled() => {
                    info!("Expiry sweeper shutting down");
                    return;
                }
            }

            self.sweep_step();
        }
    }

    /// Execute one sweep.
    fn sweep_step(&self) -> (usize, usize) {
        let replays = self.replay.purge_expired(Utc::now().timestamp_millis());
        let windows = self.rate_limiter.purge_stale(Instant::now());
        if replays > 0 || windows > 0 {
            debug!(
                replay_entries = replays,
                rate_limit_windows = windows,
                "Sweeper: purged expired entries"
            );
        }
        (replays, windows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::InMemoryReplayStore;
    use crate::config::RateLimitConfig;

    fn sweeper(window: Duration) -> (Sweeper, Arc<InMemoryReplayStore>, Arc<RateLimiter>) {
        let replay = Arc::new(InMemoryReplayStore::new());
        let limiter = Arc::new(RateLimiter::new(RateLimitConfig {
            max_requests: 10,
            window,
        }));
        let sweeper = Sweeper::new(
            replay.clone(),
            Arc::clone(&limiter),
            Duration::from_millis(10),
        );
        (sweeper, replay, limiter)
    }

    #[test]
    fn sweep_removes_only_expired_entries() {
        let (sweeper, replay, limiter) = sweeper(Duration::ZERO);
        let now = Utc::now().timestamp_millis();
        replay.try_consume("old:project_submission", now - 10_000, now - 1).unwrap();
        replay.try_consume("live:project_submission", now, now + 60_000).unwrap();
        limiter.check("203.0.113.1", Instant::now() - Duration::from_millis(5));

        assert_eq!(sweeper.sweep_step(), (1, 1));
        assert_eq!(replay.len(), 1);
        assert_eq!(limiter.tracked_clients(), 0);
    }

    #[tokio::test]
    async fn run_stops_on_cancel() {
        let (sweeper, _, _) = sweeper(Duration::from_secs(60));
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(sweeper.run(shutdown.clone()));

        shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("sweeper stops promptly")
            .unwrap();
    }
}
