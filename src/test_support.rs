// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared fixtures for unit tests.

use alloy::signers::{local::PrivateKeySigner, SignerSync};
use tempfile::TempDir;

use crate::auth::message::{build_auth_message, Scope};
use crate::config::AppConfig;
use crate::state::AppState;
use crate::storage::Database;

// Well-known development keys; never hold funds.
const PRIMARY_KEY: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";
const SECONDARY_KEY: &str = "0x8da4ef21b864d2cc526dbdb2a120bd2874c36c9d0a1fb7f8c63d7f7a8b41de8f";

/// A local wallet that signs auth messages the way the web client does.
pub struct TestWallet {
    signer: PrivateKeySigner,
}

impl TestWallet {
    pub fn primary() -> Self {
        Self::from_key(PRIMARY_KEY)
    }

    pub fn secondary() -> Self {
        Self::from_key(SECONDARY_KEY)
    }

    fn from_key(key: &str) -> Self {
        Self {
            signer: key.parse().expect("valid test key"),
        }
    }

    /// Checksummed address.
    pub fn address(&self) -> String {
        self.signer.address().to_string()
    }

    /// Hex signature over the canonical message for `scope` at `timestamp`.
    pub fn sign(&self, scope: Scope, timestamp: i64) -> String {
        let message = build_auth_message(scope, &self.address(), timestamp);
        let signature = self
            .signer
            .sign_message_sync(message.as_bytes())
            .expect("signing succeeds");
        alloy::hex::encode_prefixed(signature.as_bytes())
    }
}

/// Fresh database in a temporary directory. Keep the `TempDir` alive.
pub fn temp_db() -> (Database, TempDir) {
    let dir = tempfile::tempdir().expect("temp dir");
    let db = Database::open(&dir.path().join("test.redb")).expect("open database");
    (db, dir)
}

/// Application state over a fresh database with default config.
pub fn test_state(sync_api_key: Option<&str>) -> (AppState, TempDir) {
    let (db, dir) = temp_db();
    let config = AppConfig {
        data_dir: dir.path().to_path_buf(),
        sync_api_key: sync_api_key.map(str::to_string),
        ..AppConfig::default()
    };
    (AppState::with_in_memory_replay(config, db), dir)
}
