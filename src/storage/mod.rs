// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Persistent Storage
//!
//! All marketplace state lives in a single embedded [redb] database file
//! (`$DATA_DIR/ecochain.redb`). redb is pure Rust, ACID, and serializes
//! write transactions, so every multi-row change below (user upsert, status
//! change plus history row, ledger event plus inventory update) is committed
//! atomically.
//!
//! ## Table Layout
//!
//! ```text
//! users                   user id → StoredUser (JSON)
//! users_by_wallet         lowercase wallet → user id (unique index)
//! projects                project id → StoredProject (JSON)
//! projects_by_owner       (owner id, project id) → ()
//! project_status_history  (project id, change id) → StoredStatusChange (JSON)
//! credits_inventory       token id → CreditInventory (JSON)
//! transactions            tx hash → LedgerTransaction (JSON)
//! sequences               sequence name → last issued id
//! ```

pub mod database;
pub mod repository;

pub use database::{Database, DbError, DbResult};
pub use repository::{LedgerRepository, ProjectRepository, UserRepository};
