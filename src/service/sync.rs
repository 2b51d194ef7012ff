// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ingestion of on-chain credit events pushed by the indexer job.

use serde_json::Value;

use crate::models::{SyncEvent, SyncResponse};
use crate::storage::repository::RecordOutcome;
use crate::storage::Database;

/// Record each event independently. A malformed or failing event is counted
/// and logged without affecting the rest of the batch; a duplicate
/// transaction hash counts as processed.
pub fn process_events(db: &Database, events: Vec<Value>) -> SyncResponse {
    let total = events.len();
    let mut processed = 0;
    let mut duplicates = 0;
    let mut failed = 0;

    for (index, raw) in events.into_iter().enumerate() {
        let event: SyncEvent = match serde_json::from_value(raw) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(index, error = %e, "Skipping malformed sync event");
                failed += 1;
                continue;
            }
        };

        match db.ledger().record_event(&event) {
            Ok(RecordOutcome::Recorded) => processed += 1,
            Ok(RecordOutcome::Duplicate) => {
                processed += 1;
                duplicates += 1;
            }
            Err(e) => {
                tracing::warn!(tx_hash = %event.tx_hash, error = %e, "Failed to record sync event");
                failed += 1;
            }
        }
    }

    tracing::info!(total, processed, duplicates, failed, "Processed sync batch");
    SyncResponse {
        success: true,
        processed,
        failed,
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::temp_db;
    use serde_json::json;

    fn transfer(hash: &str) -> Value {
        json!({
            "txHash": hash,
            "from": "0x1111111111111111111111111111111111111111",
            "to": "0x2222222222222222222222222222222222222222",
            "tokenId": 1,
            "amount": 5,
            "type": "transfer",
            "timestamp": "2026-03-01T12:00:00Z"
        })
    }

    #[test]
    fn counts_processed_and_failed_events() {
        let (db, _dir) = temp_db();
        let events = vec![
            transfer("0xa"),
            json!({ "txHash": "0xb", "type": "burn" }),
            transfer("0xa"),
            transfer("0xc"),
        ];

        let result = process_events(&db, events);
        assert_eq!(
            result,
            SyncResponse {
                success: true,
                processed: 3,
                failed: 1,
                total: 4,
            }
        );
        assert_eq!(db.ledger().stats().unwrap().total_transactions, 2);
    }

    #[test]
    fn empty_batch() {
        let (db, _dir) = temp_db();
        let result = process_events(&db, Vec::new());
        assert_eq!(result.total, 0);
        assert_eq!(result.processed, 0);
    }
}
