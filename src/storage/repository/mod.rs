// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Repository layer providing typed access to the marketplace database.
//!
//! Each repository borrows the [`Database`](super::Database) and owns the
//! reads and writes for one area of the schema.

pub mod ledger;
pub mod projects;
pub mod users;

pub use ledger::{
    CreditInventory, LedgerRepository, LedgerTransaction, MarketplaceListing, MarketplaceStats,
    OwnedCredit, RecordOutcome,
};
pub use projects::{
    NewProject, ProjectLocation, ProjectRepository, StatusUpdate, StoredProject,
    StoredStatusChange,
};
pub use users::{StoredUser, UserRepository};
