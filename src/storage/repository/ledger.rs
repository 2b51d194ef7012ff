// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Credit ledger: on-chain transactions and the per-token inventory they
//! drive, plus the marketplace read queries built on top.

use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable, ReadableTableMetadata};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use super::super::database::{
    Database, DbError, DbResult, CREDITS_INVENTORY, PROJECTS, TRANSACTIONS, USERS,
};
use super::projects::StoredProject;
use super::users::StoredUser;
use crate::models::{EventKind, ProjectType, SyncEvent, VerificationStatus};

/// Supply of one credit token.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreditInventory {
    pub token_id: u64,
    pub project_id: u64,
    /// Tons still available for purchase or retirement
    pub available_supply: f64,
    pub total_supply: f64,
    pub price_per_ton: f64,
    pub is_retired: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An indexed on-chain credit transaction.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LedgerTransaction {
    pub tx_hash: String,
    /// Lowercase sender address
    pub from_address: String,
    /// Lowercase recipient address
    pub to_address: String,
    pub token_id: u64,
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub retiree_name: Option<String>,
    pub retire_reason: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl LedgerTransaction {
    fn from_event(event: &SyncEvent, received_at: DateTime<Utc>) -> Self {
        Self {
            tx_hash: event.tx_hash.clone(),
            from_address: event.from.to_lowercase(),
            to_address: event.to.to_lowercase(),
            token_id: event.token_id,
            amount: event.amount,
            kind: event.kind,
            retiree_name: event.retiree_name.clone(),
            retire_reason: event.reason.clone(),
            timestamp: event.timestamp.unwrap_or(received_at),
        }
    }
}

/// Active listing: unretired supply of a verified project.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MarketplaceListing {
    pub token_id: u64,
    pub project_id: u64,
    pub available_supply: f64,
    pub total_supply: f64,
    pub price_per_ton: f64,
    pub project_name: String,
    pub project_description: Option<String>,
    pub project_type: ProjectType,
    #[schema(value_type = Object)]
    pub metadata: Value,
    pub verification_status: VerificationStatus,
    pub owner_wallet: String,
    pub created_at: DateTime<Utc>,
}

/// Inventory of a project owned by a user, with project context.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OwnedCredit {
    #[serde(flatten)]
    pub inventory: CreditInventory,
    pub project_name: String,
    pub project_type: ProjectType,
}

/// Homepage aggregates.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MarketplaceStats {
    /// Sum of total supply over all inventory, rounded to whole tons
    pub total_credits_issued: u64,
    /// Sum of retired amounts, rounded to whole tons
    pub total_retired: u64,
    /// Distinct projects that have issued credits
    pub total_projects: u64,
    pub total_transactions: u64,
}

/// Effect of recording one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Recorded,
    /// The transaction hash was already in the ledger; nothing changed.
    Duplicate,
}

pub struct LedgerRepository<'a> {
    db: &'a Database,
}

impl<'a> LedgerRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Record an event and apply its supply change in one transaction.
    ///
    /// A transaction hash already present is skipped, so replaying a batch
    /// does not double count supply. `mint` grows an existing inventory row,
    /// or creates one when the event names a known project and a price.
    /// `retire` shrinks available supply, floored at zero, and marks the
    /// token retired once nothing is left.
    pub fn record_event(&self, event: &SyncEvent) -> DbResult<RecordOutcome> {
        let now = Utc::now();
        let write_txn = self.db.raw().begin_write()?;
        {
            let mut transactions = write_txn.open_table(TRANSACTIONS)?;
            if transactions.get(event.tx_hash.as_str())?.is_some() {
                return Ok(RecordOutcome::Duplicate);
            }
            let tx = LedgerTransaction::from_event(event, now);
            transactions.insert(tx.tx_hash.as_str(), serde_json::to_vec(&tx)?.as_slice())?;

            let mut inventory = write_txn.open_table(CREDITS_INVENTORY)?;
            let existing: Option<CreditInventory> = match inventory.get(event.token_id)? {
                Some(value) => Some(serde_json::from_slice(value.value())?),
                None => None,
            };

            let updated = match (event.kind, existing) {
                (EventKind::Mint, Some(mut row)) => {
                    row.available_supply += event.amount;
                    row.total_supply += event.amount;
                    row.updated_at = now;
                    Some(row)
                }
                (EventKind::Mint, None) => match (event.project_id, event.price_per_ton) {
                    (Some(project_id), Some(price_per_ton)) => {
                        let projects = write_txn.open_table(PROJECTS)?;
                        if projects.get(project_id)?.is_none() {
                            return Err(DbError::NotFound(format!("Project {project_id}")));
                        }
                        Some(CreditInventory {
                            token_id: event.token_id,
                            project_id,
                            available_supply: event.amount,
                            total_supply: event.amount,
                            price_per_ton,
                            is_retired: false,
                            created_at: now,
                            updated_at: now,
                        })
                    }
                    _ => None,
                },
                (EventKind::Retire, Some(mut row)) => {
                    let remaining = row.available_supply - event.amount;
                    row.available_supply = remaining.max(0.0);
                    row.is_retired = remaining <= 0.0;
                    row.updated_at = now;
                    Some(row)
                }
                _ => None,
            };

            if let Some(row) = updated {
                inventory.insert(row.token_id, serde_json::to_vec(&row)?.as_slice())?;
            }
        }
        write_txn.commit()?;

        tracing::debug!(
            tx_hash = %event.tx_hash,
            token_id = event.token_id,
            kind = ?event.kind,
            "Recorded ledger event"
        );
        Ok(RecordOutcome::Recorded)
    }

    pub fn get_transaction(&self, tx_hash: &str) -> DbResult<Option<LedgerTransaction>> {
        let read_txn = self.db.raw().begin_read()?;
        let table = read_txn.open_table(TRANSACTIONS)?;
        match table.get(tx_hash)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn get_inventory(&self, token_id: u64) -> DbResult<Option<CreditInventory>> {
        let read_txn = self.db.raw().begin_read()?;
        let table = read_txn.open_table(CREDITS_INVENTORY)?;
        match table.get(token_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Unretired, non-empty inventory of verified projects, newest first.
    pub fn listings(&self) -> DbResult<Vec<MarketplaceListing>> {
        let read_txn = self.db.raw().begin_read()?;
        let inventory = read_txn.open_table(CREDITS_INVENTORY)?;
        let projects = read_txn.open_table(PROJECTS)?;
        let users = read_txn.open_table(USERS)?;

        let mut listings = Vec::new();
        for entry in inventory.iter()? {
            let (_, value) = entry?;
            let row: CreditInventory = serde_json::from_slice(value.value())?;
            if row.is_retired || row.available_supply == 0.0 {
                continue;
            }

            let Some(project) = projects.get(row.project_id)? else {
                continue;
            };
            let project: StoredProject = serde_json::from_slice(project.value())?;
            if project.verification_status != VerificationStatus::Verified {
                continue;
            }

            let Some(owner) = users.get(project.owner_id.as_str())? else {
                continue;
            };
            let owner: StoredUser = serde_json::from_slice(owner.value())?;

            listings.push(MarketplaceListing {
                token_id: row.token_id,
                project_id: project.id,
                available_supply: row.available_supply,
                total_supply: row.total_supply,
                price_per_ton: row.price_per_ton,
                project_name: project.name,
                project_description: project.description,
                project_type: project.project_type,
                metadata: project.metadata,
                verification_status: project.verification_status,
                owner_wallet: owner.wallet_address,
                created_at: row.created_at,
            });
        }

        listings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(listings)
    }

    /// Inventory of every project owned by `owner_id`.
    pub fn credits_by_owner(&self, owner_id: &str) -> DbResult<Vec<OwnedCredit>> {
        let read_txn = self.db.raw().begin_read()?;
        let inventory = read_txn.open_table(CREDITS_INVENTORY)?;
        let projects = read_txn.open_table(PROJECTS)?;

        let mut credits = Vec::new();
        for entry in inventory.iter()? {
            let (_, value) = entry?;
            let row: CreditInventory = serde_json::from_slice(value.value())?;
            let Some(project) = projects.get(row.project_id)? else {
                continue;
            };
            let project: StoredProject = serde_json::from_slice(project.value())?;
            if project.owner_id == owner_id {
                credits.push(OwnedCredit {
                    inventory: row,
                    project_name: project.name,
                    project_type: project.project_type,
                });
            }
        }
        Ok(credits)
    }

    /// Retire transactions sent from `wallet`, newest first.
    pub fn retirements(&self, wallet: &str) -> DbResult<Vec<LedgerTransaction>> {
        let wallet = wallet.to_lowercase();
        let read_txn = self.db.raw().begin_read()?;
        let table = read_txn.open_table(TRANSACTIONS)?;

        let mut result = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            let tx: LedgerTransaction = serde_json::from_slice(value.value())?;
            if tx.kind == EventKind::Retire && tx.from_address == wallet {
                result.push(tx);
            }
        }
        result.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(result)
    }

    pub fn stats(&self) -> DbResult<MarketplaceStats> {
        let read_txn = self.db.raw().begin_read()?;
        let inventory = read_txn.open_table(CREDITS_INVENTORY)?;
        let projects = read_txn.open_table(PROJECTS)?;
        let transactions = read_txn.open_table(TRANSACTIONS)?;

        let mut issued = 0.0;
        let mut project_ids = std::collections::BTreeSet::new();
        for entry in inventory.iter()? {
            let (_, value) = entry?;
            let row: CreditInventory = serde_json::from_slice(value.value())?;
            if projects.get(row.project_id)?.is_some() {
                issued += row.total_supply;
                project_ids.insert(row.project_id);
            }
        }

        let mut retired = 0.0;
        for entry in transactions.iter()? {
            let (_, value) = entry?;
            let tx: LedgerTransaction = serde_json::from_slice(value.value())?;
            if tx.kind == EventKind::Retire {
                retired += tx.amount;
            }
        }

        Ok(MarketplaceStats {
            total_credits_issued: whole_tons(issued),
            total_retired: whole_tons(retired),
            total_projects: project_ids.len() as u64,
            total_transactions: transactions.len()?,
        })
    }
}

fn whole_tons(value: f64) -> u64 {
    value.round().max(0.0) as u64
}
