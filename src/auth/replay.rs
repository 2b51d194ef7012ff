// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Replay protection for signed auth messages.
//!
//! A consumed `(signature, scope)` pair is remembered until its expiry so the
//! same signature cannot authorize a second request inside the validity
//! window. The store is injected into the verifier; the in-memory
//! implementation is process-local and is cleared by a restart.
//!
//! Deployments running several instances need a shared implementation of
//! [`ReplayStore`] (e.g. backed by an external cache with an atomic
//! set-if-absent); the in-memory store only protects a single process.

use std::collections::HashMap;
use std::sync::Mutex;

use super::message::Scope;

#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("replay store unavailable: {0}")]
    Unavailable(String),
}

/// Time-windowed set of consumed authorization keys.
pub trait ReplayStore: Send + Sync {
    /// Atomically record `key` unless a live entry already exists.
    ///
    /// Returns `Ok(true)` if the key was recorded, `Ok(false)` if it was
    /// already consumed and has not expired at `now_ms`.
    fn try_consume(&self, key: &str, now_ms: i64, expires_at_ms: i64) -> Result<bool, ReplayError>;

    /// Drop entries whose expiry is at or before `now_ms`. Returns how many were removed.
    fn purge_expired(&self, now_ms: i64) -> usize;

    /// Number of tracked entries, expired or not.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Replay key for a canonically encoded signature under a scope.
pub fn replay_key(signature: &str, scope: Scope) -> String {
    format!("{signature}:{}", scope.as_str())
}

/// Mutex-guarded map from replay key to expiry (epoch ms).
#[derive(Debug, Default)]
pub struct InMemoryReplayStore {
    entries: Mutex<HashMap<String, i64>>,
}

impl InMemoryReplayStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReplayStore for InMemoryReplayStore {
    fn try_consume(&self, key: &str, now_ms: i64, expires_at_ms: i64) -> Result<bool, ReplayError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| ReplayError::Unavailable("lock poisoned".to_string()))?;

        // An entry past its expiry but not yet swept no longer blocks reuse.
        if let Some(&expiry) = entries.get(key) {
            if expiry > now_ms {
                return Ok(false);
            }
        }

        entries.insert(key.to_string(), expires_at_ms);
        Ok(true)
    }

    fn purge_expired(&self, now_ms: i64) -> usize {
        let Ok(mut entries) = self.entries.lock() else {
            return 0;
        };
        let before = entries.len();
        entries.retain(|_, expiry| *expiry > now_ms);
        before - entries.len()
    }

    fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }
}
