// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Static API key check for machine-to-machine endpoints (blockchain sync).

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::ApiError;
use crate::state::AppState;

/// Header carrying the sync API key.
pub const API_KEY_HEADER: &str = "x-api-key";

type HmacSha256 = Hmac<Sha256>;

const COMPARE_DOMAIN: &[u8] = b"ecochain-api-key-compare";

/// Compare two keys in constant time.
///
/// Both values are MACed first so the comparison length does not depend on
/// the secret.
pub fn keys_match(expected: &str, provided: &str) -> bool {
    let tag = |value: &str| -> Option<Vec<u8>> {
        let mut mac = HmacSha256::new_from_slice(COMPARE_DOMAIN).ok()?;
        mac.update(value.as_bytes());
        Some(mac.finalize().into_bytes().to_vec())
    };

    let Some(expected_tag) = tag(expected) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(COMPARE_DOMAIN) else {
        return false;
    };
    mac.update(provided.as_bytes());
    mac.verify_slice(&expected_tag).is_ok()
}

/// Middleware requiring `x-api-key` to equal the configured `SYNC_API_KEY`.
///
/// Responds 503 when no key is configured and 401 on a missing or wrong key.
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = state.config.sync_api_key.as_deref() else {
        tracing::error!("SYNC_API_KEY is not configured");
        return ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "MISCONFIGURED",
            "Service misconfigured",
        )
        .into_response();
    };

    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if !keys_match(expected, provided) {
        tracing::warn!(path = %request.uri().path(), "Rejected request with invalid API key");
        return ApiError::new(
            StatusCode::UNAUTHORIZED,
            "AUTH_ERROR",
            "Unauthorized: invalid or missing API key",
        )
        .into_response();
    }

    next.run(request).await
}
