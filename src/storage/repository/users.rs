// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User repository.
//!
//! Users are keyed by a random UUID and indexed by lowercase wallet address.
//! The index is unique: resolve-or-create runs inside one write transaction,
//! and redb admits one writer at a time, so concurrent first requests from a
//! new wallet still produce a single user.

use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::super::database::{Database, DbError, DbResult, USERS, USERS_BY_WALLET};
use crate::auth::Role;

/// Marketplace user, identified by wallet.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StoredUser {
    /// Unique user identifier (UUID)
    pub id: String,
    /// Lowercase wallet address
    pub wallet_address: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct UserRepository<'a> {
    db: &'a Database,
}

impl<'a> UserRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Return the user for `wallet`, creating a buyer if none exists.
    pub fn get_or_create(&self, wallet: &str) -> DbResult<StoredUser> {
        self.upsert(wallet, None)
    }

    /// Assign `role` to the user for `wallet`, creating the user if needed.
    pub fn set_role(&self, wallet: &str, role: Role) -> DbResult<StoredUser> {
        self.upsert(wallet, Some(role))
    }

    fn upsert(&self, wallet: &str, role: Option<Role>) -> DbResult<StoredUser> {
        let wallet = wallet.to_lowercase();
        let now = Utc::now();

        let write_txn = self.db.raw().begin_write()?;
        let user = {
            let mut index = write_txn.open_table(USERS_BY_WALLET)?;
            let mut users = write_txn.open_table(USERS)?;

            let existing_id = index.get(wallet.as_str())?.map(|v| v.value().to_string());
            let existing = match existing_id {
                Some(id) => {
                    let bytes = users
                        .get(id.as_str())?
                        .map(|v| v.value().to_vec())
                        .ok_or_else(|| DbError::NotFound(format!("User {id}")))?;
                    Some(serde_json::from_slice::<StoredUser>(&bytes)?)
                }
                None => None,
            };

            match (existing, role) {
                (Some(user), None) => user,
                (Some(user), Some(role)) if user.role == role => user,
                (Some(mut user), Some(role)) => {
                    user.role = role;
                    user.updated_at = now;
                    users.insert(user.id.as_str(), serde_json::to_vec(&user)?.as_slice())?;
                    user
                }
                (None, role) => {
                    let user = StoredUser {
                        id: Uuid::new_v4().to_string(),
                        wallet_address: wallet.clone(),
                        role: role.unwrap_or_default(),
                        created_at: now,
                        updated_at: now,
                    };
                    users.insert(user.id.as_str(), serde_json::to_vec(&user)?.as_slice())?;
                    index.insert(wallet.as_str(), user.id.as_str())?;
                    tracing::info!(user_id = %user.id, wallet = %wallet, "Created user");
                    user
                }
            }
        };
        write_txn.commit()?;
        Ok(user)
    }

    /// Look up a user by wallet (case-insensitive).
    pub fn find_by_wallet(&self, wallet: &str) -> DbResult<Option<StoredUser>> {
        let wallet = wallet.to_lowercase();
        let read_txn = self.db.raw().begin_read()?;
        let index = read_txn.open_table(USERS_BY_WALLET)?;
        let Some(id) = index.get(wallet.as_str())?.map(|v| v.value().to_string()) else {
            return Ok(None);
        };
        let users = read_txn.open_table(USERS)?;
        match users.get(id.as_str())? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get a user by id.
    pub fn get(&self, id: &str) -> DbResult<StoredUser> {
        let read_txn = self.db.raw().begin_read()?;
        let users = read_txn.open_table(USERS)?;
        match users.get(id)? {
            Some(value) => Ok(serde_json::from_slice(value.value())?),
            None => Err(DbError::NotFound(format!("User {id}"))),
        }
    }
}
