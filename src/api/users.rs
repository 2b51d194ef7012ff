// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    error::{ApiError, AppError, ErrorBody},
    models::{RetirementsResponse, UserProjectsResponse, WalletAddress},
    state::AppState,
    storage::repository::OwnedCredit,
};

fn parse_wallet(raw: String) -> Result<WalletAddress, ApiError> {
    if !WalletAddress::is_well_formed(&raw) {
        return Err(AppError::validation("Invalid wallet address").into());
    }
    Ok(WalletAddress(raw))
}

/// Projects submitted by a wallet, newest first.
#[utoipa::path(
    get,
    path = "/api/users/{wallet}/projects",
    params(("wallet" = String, Path, description = "0x-prefixed wallet address")),
    tag = "Users",
    responses(
        (status = 200, body = UserProjectsResponse),
        (status = 400, body = ErrorBody)
    )
)]
pub async fn user_projects(
    State(state): State<AppState>,
    Path(wallet): Path<String>,
) -> Result<Json<UserProjectsResponse>, ApiError> {
    let wallet = parse_wallet(wallet)?;
    let projects = match state.db.users().find_by_wallet(&wallet.0)? {
        Some(user) => state.db.projects().list_by_owner(&user.id)?,
        None => Vec::new(),
    };
    Ok(Json(UserProjectsResponse {
        wallet_address: wallet.normalized(),
        projects,
    }))
}

/// Credit inventory of the wallet's projects.
#[utoipa::path(
    get,
    path = "/api/users/{wallet}/credits",
    params(("wallet" = String, Path, description = "0x-prefixed wallet address")),
    tag = "Users",
    responses(
        (status = 200, body = [OwnedCredit]),
        (status = 400, body = ErrorBody)
    )
)]
pub async fn user_credits(
    State(state): State<AppState>,
    Path(wallet): Path<String>,
) -> Result<Json<Vec<OwnedCredit>>, ApiError> {
    let wallet = parse_wallet(wallet)?;
    let credits = match state.db.users().find_by_wallet(&wallet.0)? {
        Some(user) => state.db.ledger().credits_by_owner(&user.id)?,
        None => Vec::new(),
    };
    Ok(Json(credits))
}

/// Retirement history of a wallet, newest first.
#[utoipa::path(
    get,
    path = "/api/users/{wallet}/retirements",
    params(("wallet" = String, Path, description = "0x-prefixed wallet address")),
    tag = "Users",
    responses(
        (status = 200, body = RetirementsResponse),
        (status = 400, body = ErrorBody)
    )
)]
pub async fn user_retirements(
    State(state): State<AppState>,
    Path(wallet): Path<String>,
) -> Result<Json<RetirementsResponse>, ApiError> {
    let wallet = parse_wallet(wallet)?;
    let retirements = state.db.ledger().retirements(&wallet.0)?;
    Ok(Json(RetirementsResponse {
        wallet_address: wallet.normalized(),
        retirements,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_state;
    use axum::http::StatusCode;

    const WALLET: &str = "0x742d35Cc6634C0532925a3b844Bc9e7595f4aB12";

    #[tokio::test]
    async fn unknown_wallet_has_no_projects() {
        let (state, _dir) = test_state(None);
        let Json(body) = user_projects(State(state), Path(WALLET.to_string()))
            .await
            .unwrap();
        assert!(body.projects.is_empty());
        assert_eq!(body.wallet_address, WALLET.to_lowercase());
    }

    #[tokio::test]
    async fn malformed_wallet_is_rejected() {
        let (state, _dir) = test_state(None);
        let err = user_retirements(State(state), Path("0x123".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.body.error, "Invalid wallet address");
    }

    #[tokio::test]
    async fn credits_for_unknown_wallet_are_empty() {
        let (state, _dir) = test_state(None);
        let Json(credits) = user_credits(State(state), Path(WALLET.to_string()))
            .await
            .unwrap();
        assert!(credits.is_empty());
    }
}
