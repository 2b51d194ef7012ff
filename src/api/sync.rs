// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde_json::Value;

use crate::{
    error::{ApiError, AppError, ErrorBody},
    models::{SyncRequest, SyncResponse, SyncStatusResponse},
    service::process_events,
    state::AppState,
};

/// Ingest a batch of on-chain events. Requires `x-api-key`.
#[utoipa::path(
    post,
    path = "/api/sync",
    request_body = SyncRequest,
    tag = "Sync",
    params(("x-api-key" = String, Header, description = "Value of SYNC_API_KEY")),
    responses(
        (status = 200, body = SyncResponse),
        (status = 400, description = "Body is not `{events: [...]}`", body = ErrorBody),
        (status = 401, body = ErrorBody),
        (status = 503, description = "SYNC_API_KEY is not configured", body = ErrorBody)
    )
)]
pub async fn ingest_events(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<SyncResponse>, ApiError> {
    let events = match body {
        Ok(Json(Value::Object(mut map))) => match map.remove("events") {
            Some(Value::Array(events)) => events,
            _ => return Err(invalid_payload()),
        },
        _ => return Err(invalid_payload()),
    };

    Ok(Json(process_events(&state.db, events)))
}

fn invalid_payload() -> ApiError {
    AppError::validation("Invalid events payload").into()
}

/// Sync service status. Requires `x-api-key`.
#[utoipa::path(
    get,
    path = "/api/sync",
    tag = "Sync",
    params(("x-api-key" = String, Header, description = "Value of SYNC_API_KEY")),
    responses(
        (status = 200, body = SyncStatusResponse),
        (status = 401, body = ErrorBody),
        (status = 503, description = "SYNC_API_KEY is not configured", body = ErrorBody)
    )
)]
pub async fn sync_status() -> Json<SyncStatusResponse> {
    Json(SyncStatusResponse {
        status: "ok".to_string(),
        message: "EcoChain Sync Service - POST events to this endpoint".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_state;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn rejects_body_without_event_array() {
        let (state, _dir) = test_state(Some("key"));
        for body in [json!({}), json!({ "events": "x" }), json!([1, 2])] {
            let err = ingest_events(State(state.clone()), Ok(Json(body)))
                .await
                .unwrap_err();
            assert_eq!(err.status, StatusCode::BAD_REQUEST);
            assert_eq!(err.body.error, "Invalid events payload");
        }
    }

    #[tokio::test]
    async fn records_events() {
        let (state, _dir) = test_state(Some("key"));
        let body = json!({
            "events": [{
                "txHash": "0xfeed",
                "from": "0x1111111111111111111111111111111111111111",
                "to": "0x2222222222222222222222222222222222222222",
                "tokenId": 3,
                "amount": 1.5,
                "type": "retire",
                "retireeName": "Acme Corp",
                "reason": "2025 offsets"
            }]
        });

        let Json(result) = ingest_events(State(state.clone()), Ok(Json(body)))
            .await
            .unwrap();
        assert_eq!(result.processed, 1);
        assert_eq!(result.failed, 0);

        let tx = state.db.ledger().get_transaction("0xfeed").unwrap().unwrap();
        assert_eq!(tx.retiree_name.as_deref(), Some("Acme Corp"));
        assert_eq!(tx.retire_reason.as_deref(), Some("2025 offsets"));
    }

    #[tokio::test]
    async fn status_message() {
        let Json(body) = sync_status().await;
        assert_eq!(body.status, "ok");
    }
}
