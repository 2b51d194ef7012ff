// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded marketplace database backed by redb.

use std::path::Path;

use redb::{ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};

use super::repository::{LedgerRepository, ProjectRepository, UserRepository};
use crate::models::VerificationStatus;

// =============================================================================
// Table Definitions
// =============================================================================

/// Primary table: user id → serialized StoredUser (JSON bytes).
pub(crate) const USERS: TableDefinition<&str, &[u8]> = TableDefinition::new("users");

/// Unique index: lowercase wallet address → user id.
pub(crate) const USERS_BY_WALLET: TableDefinition<&str, &str> =
    TableDefinition::new("users_by_wallet");

/// Primary table: project id → serialized StoredProject (JSON bytes).
pub(crate) const PROJECTS: TableDefinition<u64, &[u8]> = TableDefinition::new("projects");

/// Index: (owner user id, project id) for per-owner listing.
pub(crate) const PROJECTS_BY_OWNER: TableDefinition<(&str, u64), ()> =
    TableDefinition::new("projects_by_owner");

/// Audit trail: (project id, change id) → serialized StoredStatusChange.
pub(crate) const PROJECT_STATUS_HISTORY: TableDefinition<(u64, u64), &[u8]> =
    TableDefinition::new("project_status_history");

/// Token id → serialized CreditInventory.
pub(crate) const CREDITS_INVENTORY: TableDefinition<u64, &[u8]> =
    TableDefinition::new("credits_inventory");

/// Transaction hash → serialized LedgerTransaction.
pub(crate) const TRANSACTIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("transactions");

/// Sequence name → last issued id.
pub(crate) const SEQUENCES: TableDefinition<&str, u64> = TableDefinition::new("sequences");

pub(crate) const PROJECT_SEQUENCE: &str = "projects";
pub(crate) const STATUS_CHANGE_SEQUENCE: &str = "project_status_history";

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("cannot change status from {from} to {to}")]
    InvalidTransition {
        from: VerificationStatus,
        to: VerificationStatus,
    },
}

pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Database
// =============================================================================

/// Embedded ACID marketplace database.
pub struct Database {
    db: redb::Database,
}

impl Database {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> DbResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = redb::Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(USERS)?;
            let _ = write_txn.open_table(USERS_BY_WALLET)?;
            let _ = write_txn.open_table(PROJECTS)?;
            let _ = write_txn.open_table(PROJECTS_BY_OWNER)?;
            let _ = write_txn.open_table(PROJECT_STATUS_HISTORY)?;
            let _ = write_txn.open_table(CREDITS_INVENTORY)?;
            let _ = write_txn.open_table(TRANSACTIONS)?;
            let _ = write_txn.open_table(SEQUENCES)?;
        }
        write_txn.commit()?;

        tracing::info!(path = %path.display(), "Opened marketplace database");
        Ok(Self { db })
    }

    pub(crate) fn raw(&self) -> &redb::Database {
        &self.db
    }

    pub fn users(&self) -> UserRepository<'_> {
        UserRepository::new(self)
    }

    pub fn projects(&self) -> ProjectRepository<'_> {
        ProjectRepository::new(self)
    }

    pub fn ledger(&self) -> LedgerRepository<'_> {
        LedgerRepository::new(self)
    }

    /// Readiness probe: a read transaction can be opened.
    pub fn check(&self) -> DbResult<()> {
        let read_txn = self.db.begin_read()?;
        let _ = read_txn.open_table(SEQUENCES)?;
        Ok(())
    }
}

/// Issue the next id of `sequence` inside an open write transaction.
pub(crate) fn next_id(txn: &WriteTransaction, sequence: &str) -> DbResult<u64> {
    let mut table = txn.open_table(SEQUENCES)?;
    let next = table.get(sequence)?.map(|v| v.value()).unwrap_or(0) + 1;
    table.insert(sequence, next)?;
    Ok(next)
}
