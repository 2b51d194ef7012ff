// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Public read endpoints backing the marketplace, homepage and impact map.

use axum::{extract::State, Json};

use crate::{
    error::{ApiError, ErrorBody},
    models::{ListingsResponse, NetworkInfoResponse},
    state::AppState,
    storage::repository::{MarketplaceStats, ProjectLocation},
};

#[utoipa::path(
    get,
    path = "/api/marketplace/listings",
    tag = "Marketplace",
    responses(
        (status = 200, description = "Unretired credits of verified projects, newest first", body = ListingsResponse),
        (status = 500, body = ErrorBody)
    )
)]
pub async fn listings(State(state): State<AppState>) -> Result<Json<ListingsResponse>, ApiError> {
    let listings = state.db.ledger().listings()?;
    Ok(Json(ListingsResponse { listings }))
}

#[utoipa::path(
    get,
    path = "/api/stats",
    tag = "Marketplace",
    responses((status = 200, body = MarketplaceStats))
)]
pub async fn stats(State(state): State<AppState>) -> Result<Json<MarketplaceStats>, ApiError> {
    Ok(Json(state.db.ledger().stats()?))
}

#[utoipa::path(
    get,
    path = "/api/impact/locations",
    tag = "Marketplace",
    responses((status = 200, description = "Verified project locations", body = [ProjectLocation]))
)]
pub async fn project_locations(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProjectLocation>>, ApiError> {
    Ok(Json(state.db.projects().verified_locations()?))
}

#[utoipa::path(
    get,
    path = "/api/network",
    tag = "Marketplace",
    responses((status = 200, body = NetworkInfoResponse))
)]
pub async fn network(State(state): State<AppState>) -> Json<NetworkInfoResponse> {
    let network = &state.config.network;
    Json(NetworkInfoResponse {
        name: network.name.clone(),
        chain_id: network.chain_id,
        credits_contract: network.credits_contract.clone(),
        marketplace_contract: network.marketplace_contract.clone(),
    })
}
