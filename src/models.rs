// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! This module defines the request and response data structures used by
//! the REST API. All types derive `Serialize` and/or `Deserialize`, and
//! `ToSchema` for the OpenAPI document. Field names are camelCase on the wire
//! to match the web client.
//!
//! Persisted records (users, projects, inventory, ledger rows) live with
//! their repositories in [`crate::storage::repository`] and are returned as-is.
//!
//! ## Model Categories
//!
//! - **Projects**: submission and review payloads
//! - **Queries**: listing, history and stats responses
//! - **Sync**: on-chain events pushed by the indexer job

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::storage::repository::{LedgerTransaction, MarketplaceListing, StoredProject, StoredStatusChange};

// =============================================================================
// Wallet Address Type
// =============================================================================

/// Ethereum-compatible wallet address wrapper.
///
/// Format: `0x` followed by 40 hexadecimal characters (20 bytes). Addresses
/// are stored and compared lowercased.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WalletAddress(pub String);

impl WalletAddress {
    /// Whether `value` matches `^0x[a-fA-F0-9]{40}$`.
    pub fn is_well_formed(value: &str) -> bool {
        value.len() == 42
            && value.starts_with("0x")
            && value[2..].bytes().all(|b| b.is_ascii_hexdigit())
    }

    /// Canonical lowercase form used as the storage key.
    pub fn normalized(&self) -> String {
        self.0.to_lowercase()
    }
}

impl std::fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for WalletAddress {
    fn from(value: &str) -> Self {
        WalletAddress(value.to_string())
    }
}

impl From<String> for WalletAddress {
    fn from(value: String) -> Self {
        WalletAddress(value)
    }
}

// =============================================================================
// Project Enums
// =============================================================================

/// Category of a carbon project.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ProjectType {
    Reforestation,
    Conservation,
    Renewable,
    Industrial,
}

impl ProjectType {
    pub const ALL: [ProjectType; 4] = [
        ProjectType::Reforestation,
        ProjectType::Conservation,
        ProjectType::Renewable,
        ProjectType::Industrial,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectType::Reforestation => "reforestation",
            ProjectType::Conservation => "conservation",
            ProjectType::Renewable => "renewable",
            ProjectType::Industrial => "industrial",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == value)
    }
}

impl std::fmt::Display for ProjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Review state of a project.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    #[default]
    Pending,
    Verified,
    Rejected,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Pending => "pending",
            VerificationStatus::Verified => "verified",
            VerificationStatus::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(VerificationStatus::Pending),
            "verified" => Some(VerificationStatus::Verified),
            "rejected" => Some(VerificationStatus::Rejected),
            _ => None,
        }
    }

    /// Only pending projects can be decided, and only once.
    pub fn can_transition_to(self, next: VerificationStatus) -> bool {
        matches!(
            (self, next),
            (VerificationStatus::Pending, VerificationStatus::Verified)
                | (VerificationStatus::Pending, VerificationStatus::Rejected)
        )
    }
}

impl std::fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Project Requests
// =============================================================================

/// A coordinate as sent by the form: a JSON number or a numeric string.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(untagged)]
pub enum Coordinate {
    Number(f64),
    Text(String),
}

/// Signed project submission.
///
/// Fields are optional at the wire level so that missing values surface as
/// field errors from [`crate::validation`] instead of a JSON rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitProjectRequest {
    /// Submitter wallet; must match the signer.
    pub wallet_address: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    /// One of `reforestation`, `conservation`, `renewable`, `industrial`.
    #[serde(rename = "type")]
    pub project_type: Option<String>,
    pub country: Option<String>,
    pub lat: Option<Coordinate>,
    pub lng: Option<Coordinate>,
    /// HTTPS endpoint of the project's IoT feed. Empty string means none.
    pub api_endpoint: Option<String>,
    /// `personal_sign` signature over `EcoChain:project_submission:<wallet>:<timestamp>`.
    pub signature: Option<String>,
    /// Epoch milliseconds embedded in the signed message.
    pub timestamp: Option<i64>,
}

/// Result of a successful submission.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitProjectResponse {
    pub success: bool,
    pub project_id: u64,
    pub message: String,
}

/// Signed admin decision on a pending project.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewProjectRequest {
    pub reviewer_wallet: Option<String>,
    /// `verified` or `rejected`.
    pub status: Option<String>,
    pub reason: Option<String>,
    /// `personal_sign` signature over `EcoChain:project_review:<wallet>:<timestamp>`.
    pub signature: Option<String>,
    pub timestamp: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewProjectResponse {
    pub success: bool,
    pub project: StoredProject,
}

// =============================================================================
// Query Responses
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDetailResponse {
    pub project: StoredProject,
    /// Status changes, oldest first.
    pub history: Vec<StoredStatusChange>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProjectsResponse {
    pub wallet_address: String,
    pub projects: Vec<StoredProject>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RetirementsResponse {
    pub wallet_address: String,
    /// Retire transactions sent by the wallet, newest first.
    pub retirements: Vec<LedgerTransaction>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListingsResponse {
    pub listings: Vec<MarketplaceListing>,
}

/// Chain configuration surfaced to the web client.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInfoResponse {
    pub name: String,
    pub chain_id: u64,
    pub credits_contract: Option<String>,
    pub marketplace_contract: Option<String>,
}

// =============================================================================
// Sync Models
// =============================================================================

/// Kind of on-chain credit movement.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Mint,
    Transfer,
    Retire,
    Purchase,
}

/// One indexed token event.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncEvent {
    pub tx_hash: String,
    pub from: String,
    pub to: String,
    pub token_id: u64,
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub retiree_name: Option<String>,
    pub reason: Option<String>,
    /// Block time; defaults to the time of ingestion.
    pub timestamp: Option<DateTime<Utc>>,
    /// Project the token belongs to. With `pricePerTon`, lets a mint create
    /// the inventory row.
    pub project_id: Option<u64>,
    pub price_per_ton: Option<f64>,
}

/// Batch pushed to `POST /api/sync`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SyncRequest {
    pub events: Vec<SyncEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SyncResponse {
    pub success: bool,
    pub processed: usize,
    pub failed: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SyncStatusResponse {
    pub status: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wallet_address_shape() {
        assert!(WalletAddress::is_well_formed(
            "0x742d35Cc6634C0532925a3b844Bc9e7595f4aB12"
        ));
        assert!(!WalletAddress::is_well_formed(
            "742d35Cc6634C0532925a3b844Bc9e7595f4aB12"
        ));
        assert!(!WalletAddress::is_well_formed("0x742d35"));
        assert!(!WalletAddress::is_well_formed(
            "0xZZ2d35Cc6634C0532925a3b844Bc9e7595f4aB12"
        ));
    }

    #[test]
    fn only_pending_projects_transition() {
        use VerificationStatus::*;
        assert!(Pending.can_transition_to(Verified));
        assert!(Pending.can_transition_to(Rejected));
        assert!(!Pending.can_transition_to(Pending));
        assert!(!Verified.can_transition_to(Rejected));
        assert!(!Rejected.can_transition_to(Verified));
    }

    #[test]
    fn submission_accepts_numeric_or_string_coordinates() {
        let req: SubmitProjectRequest = serde_json::from_value(serde_json::json!({
            "walletAddress": "0x742d35Cc6634C0532925a3b844Bc9e7595f4aB12",
            "name": "Mangrove restoration",
            "type": "conservation",
            "lat": -3.1,
            "lng": "-60.02",
            "signature": "0x00",
            "timestamp": 1_700_000_000_000i64
        }))
        .unwrap();

        assert_eq!(req.project_type.as_deref(), Some("conservation"));
        assert_eq!(req.lat, Some(Coordinate::Number(-3.1)));
        assert_eq!(req.lng, Some(Coordinate::Text("-60.02".into())));
    }

    #[test]
    fn sync_event_uses_wire_names() {
        let event: SyncEvent = serde_json::from_value(serde_json::json!({
            "txHash": "0xabc",
            "from": "0x0000000000000000000000000000000000000000",
            "to": "0x742d35cc6634c0532925a3b844bc9e7595f4ab12",
            "tokenId": 7,
            "amount": 12.5,
            "type": "mint",
            "timestamp": "2026-01-02T03:04:05Z"
        }))
        .unwrap();
        assert_eq!(event.kind, EventKind::Mint);
        assert_eq!(event.token_id, 7);
        assert!(event.timestamp.is_some());
    }
}
