// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Canonical messages signed by wallets to authorize an action.
//!
//! Format: `EcoChain:<scope>:<wallet-lowercased>:<timestamp-ms>`.
//! The client signs exactly this string, so field order and the lowercase
//! wallet are part of the contract.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Application name prefixed to every auth message.
pub const APP_NAME: &str = "EcoChain";

/// Action a signed message authorizes.
///
/// The scope is part of both the message and the replay key, so a signature
/// for one action cannot be replayed for another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Scope {
    #[serde(rename = "project_submission")]
    Submission,
    #[serde(rename = "project_review")]
    Review,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Submission => "project_submission",
            Scope::Review => "project_review",
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build the message a wallet signs for `scope` at `timestamp_ms`.
pub fn build_auth_message(scope: Scope, wallet: &str, timestamp_ms: i64) -> String {
    format!(
        "{APP_NAME}:{}:{}:{timestamp_ms}",
        scope.as_str(),
        wallet.to_lowercase()
    )
}

pub fn build_submission_message(wallet: &str, timestamp_ms: i64) -> String {
    build_auth_message(Scope::Submission, wallet, timestamp_ms)
}

pub fn build_review_message(wallet: &str, timestamp_ms: i64) -> String {
    build_auth_message(Scope::Review, wallet, timestamp_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    const WALLET: &str = "0xAbCdEf0123456789aBcDeF0123456789AbCdEf01";

    #[test]
    fn message_has_expected_layout() {
        let msg = build_auth_message(Scope::Submission, WALLET, 1_700_000_000_000);
        assert_eq!(
            msg,
            "EcoChain:project_submission:0xabcdef0123456789abcdef0123456789abcdef01:1700000000000"
        );
    }

    #[test]
    fn wallet_case_does_not_change_message() {
        let upper = build_auth_message(Scope::Review, &WALLET.to_uppercase().replace("0X", "0x"), 42);
        let lower = build_auth_message(Scope::Review, &WALLET.to_lowercase(), 42);
        assert_eq!(upper, lower);
        assert_eq!(build_review_message(WALLET, 42), lower);
    }

    #[test]
    fn scopes_produce_distinct_messages() {
        assert_ne!(
            build_submission_message(WALLET, 1),
            build_review_message(WALLET, 1)
        );
    }

    #[test]
    fn scope_serializes_to_wire_tag() {
        assert_eq!(
            serde_json::to_string(&Scope::Submission).unwrap(),
            r#""project_submission""#
        );
        assert_eq!(Scope::Review.to_string(), "project_review");
    }
}
