// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::{InMemoryReplayStore, RateLimiter, ReplayStore, SignatureVerifier};
use crate::config::AppConfig;
use crate::service::ProjectService;
use crate::storage::Database;

/// Shared handles passed to every handler and middleware.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: Arc<Database>,
    pub rate_limiter: Arc<RateLimiter>,
    pub projects: ProjectService,
}

impl AppState {
    /// Wire state around an open database and an injected replay store.
    pub fn new(config: AppConfig, db: Database, replay: Arc<dyn ReplayStore>) -> Self {
        let db = Arc::new(db);
        let verifier = SignatureVerifier::new(replay).with_window(config.signature_window);
        let rate_limiter = Arc::new(RateLimiter::new(config.rate_limit));
        let projects = ProjectService::new(Arc::clone(&db), verifier);
        Self {
            config: Arc::new(config),
            db,
            rate_limiter,
            projects,
        }
    }

    /// State backed by the process-local replay store.
    pub fn with_in_memory_replay(config: AppConfig, db: Database) -> Self {
        Self::new(config, db, Arc::new(InMemoryReplayStore::new()))
    }
}
