// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::rejection::JsonRejection,
    middleware,
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{api_key::require_api_key, rate_limit::rate_limit, Role},
    error::{ApiError, AppError, ErrorBody, FieldErrors},
    models::{
        EventKind, ListingsResponse, NetworkInfoResponse, ProjectDetailResponse, ProjectType,
        RetirementsResponse, ReviewProjectRequest, ReviewProjectResponse, SubmitProjectRequest,
        SubmitProjectResponse, SyncEvent, SyncRequest, SyncResponse, SyncStatusResponse,
        UserProjectsResponse, VerificationStatus, WalletAddress,
    },
    security::with_security_headers,
    state::AppState,
    storage::repository::{
        CreditInventory, LedgerTransaction, MarketplaceListing, MarketplaceStats, OwnedCredit,
        ProjectLocation, StoredProject, StoredStatusChange,
    },
};

pub mod health;
pub mod marketplace;
pub mod projects;
pub mod sync;
pub mod users;

const DATA_ERROR_PREFIX: &str = "Failed to deserialize the JSON body into the target type: ";

/// Unwrap a JSON body, turning any rejection into a 400.
///
/// Well-formed JSON with a mistyped field reports that field in `details`.
pub(crate) fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(JsonRejection::JsonDataError(err)) => {
            let text = err.body_text();
            tracing::debug!(error = %text, "Rejected request body");
            Err(AppError::validation_with("Validation failed", data_error_details(&text)).into())
        }
        Err(rejection) => {
            tracing::debug!(error = %rejection.body_text(), "Rejected request body");
            Err(AppError::validation("Invalid request body").into())
        }
    }
}

/// Split `"<path>: <message> at line L column C"` into a field entry.
fn data_error_details(text: &str) -> FieldErrors {
    let detail = text.strip_prefix(DATA_ERROR_PREFIX).unwrap_or(text);
    let (field, message) = match detail.split_once(": ") {
        Some((path, rest)) if is_field_path(path) => (path, rest),
        _ => ("body", detail),
    };
    let message = message.rsplit_once(" at line ").map_or(message, |(m, _)| m);
    FieldErrors::from([(field.to_string(), vec![message.to_string()])])
}

fn is_field_path(path: &str) -> bool {
    !path.is_empty()
        && path != "."
        && path
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '[' | ']'))
}

pub fn router(state: AppState) -> Router {
    let sync_routes = get(sync::sync_status)
        .post(sync::ingest_events)
        .route_layer(middleware::from_fn_with_state(state.clone(), require_api_key));

    let api_routes = Router::new()
        .route("/projects", post(projects::submit_project))
        .route("/projects/{id}", get(projects::get_project))
        .route("/projects/{id}/status", post(projects::review_project))
        .route("/users/{wallet}/projects", get(users::user_projects))
        .route("/users/{wallet}/credits", get(users::user_credits))
        .route("/users/{wallet}/retirements", get(users::user_retirements))
        .route("/marketplace/listings", get(marketplace::listings))
        .route("/stats", get(marketplace::stats))
        .route("/network", get(marketplace::network))
        .route("/impact/locations", get(marketplace::project_locations))
        .route("/sync", sync_routes)
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit));

    let app = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .nest("/api", api_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state);

    with_security_headers(app)
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        health::readiness,
        projects::submit_project,
        projects::get_project,
        projects::review_project,
        users::user_projects,
        users::user_credits,
        users::user_retirements,
        marketplace::listings,
        marketplace::stats,
        marketplace::network,
        marketplace::project_locations,
        sync::sync_status,
        sync::ingest_events
    ),
    components(
        schemas(
            ErrorBody,
            WalletAddress,
            Role,
            ProjectType,
            VerificationStatus,
            SubmitProjectRequest,
            SubmitProjectResponse,
            ReviewProjectRequest,
            ReviewProjectResponse,
            ProjectDetailResponse,
            StoredProject,
            StoredStatusChange,
            ProjectLocation,
            UserProjectsResponse,
            RetirementsResponse,
            OwnedCredit,
            CreditInventory,
            MarketplaceListing,
            ListingsResponse,
            MarketplaceStats,
            NetworkInfoResponse,
            LedgerTransaction,
            EventKind,
            SyncEvent,
            SyncRequest,
            SyncResponse,
            SyncStatusResponse,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Projects", description = "Signed project submission and admin review"),
        (name = "Users", description = "Per-wallet projects, credits and retirements"),
        (name = "Marketplace", description = "Listings, platform statistics and network info"),
        (name = "Sync", description = "On-chain event ingestion")
    )
)]
struct ApiDoc;
