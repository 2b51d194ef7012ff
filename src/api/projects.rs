// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};

use super::json_body;
use crate::{
    error::{ApiError, AppError, ErrorBody},
    models::{
        ProjectDetailResponse, ReviewProjectRequest, ReviewProjectResponse, SubmitProjectRequest,
        SubmitProjectResponse,
    },
    state::AppState,
    validation::{validate_review, validate_submission},
};

/// Message returned when submission fails for an unexpected reason.
const SUBMIT_FAILED_MESSAGE: &str = "Failed to submit project. Please try again.";

/// Submit a signed project for verification.
#[utoipa::path(
    post,
    path = "/api/projects",
    request_body = SubmitProjectRequest,
    tag = "Projects",
    responses(
        (status = 201, body = SubmitProjectResponse),
        (status = 400, description = "Validation failed or signature missing", body = ErrorBody),
        (status = 401, description = "Signature expired, invalid, mismatched or reused", body = ErrorBody),
        (status = 429, body = ErrorBody),
        (status = 500, body = ErrorBody)
    )
)]
pub async fn submit_project(
    State(state): State<AppState>,
    body: Result<Json<SubmitProjectRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SubmitProjectResponse>), ApiError> {
    let request = json_body(body)?;
    let submission = validate_submission(request)
        .map_err(|details| AppError::validation_with("Validation failed", details))?;

    let project = state
        .projects
        .create_project(submission)
        .map_err(|e| ApiError::with_generic(e, SUBMIT_FAILED_MESSAGE))?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitProjectResponse {
            success: true,
            project_id: project.id,
            message: format!("Project \"{}\" submitted for verification.", project.name),
        }),
    ))
}

/// Fetch a project with its status history.
#[utoipa::path(
    get,
    path = "/api/projects/{id}",
    params(("id" = u64, Path, description = "Project id")),
    tag = "Projects",
    responses(
        (status = 200, body = ProjectDetailResponse),
        (status = 404, body = ErrorBody)
    )
)]
pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<ProjectDetailResponse>, ApiError> {
    let project = state.db.projects().get(id)?;
    let history = state.db.projects().history(id)?;
    Ok(Json(ProjectDetailResponse { project, history }))
}

/// Verify or reject a pending project (admin, signed).
#[utoipa::path(
    post,
    path = "/api/projects/{id}/status",
    params(("id" = u64, Path, description = "Project id")),
    request_body = ReviewProjectRequest,
    tag = "Projects",
    responses(
        (status = 200, body = ReviewProjectResponse),
        (status = 400, body = ErrorBody),
        (status = 401, body = ErrorBody),
        (status = 403, description = "Reviewer is not an admin", body = ErrorBody),
        (status = 404, body = ErrorBody),
        (status = 409, description = "Project is not pending", body = ErrorBody)
    )
)]
pub async fn review_project(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    body: Result<Json<ReviewProjectRequest>, JsonRejection>,
) -> Result<Json<ReviewProjectResponse>, ApiError> {
    let request = json_body(body)?;
    let review = validate_review(request)
        .map_err(|details| AppError::validation_with("Validation failed", details))?;

    let project = state.projects.update_status(id, review)?;
    Ok(Json(ReviewProjectResponse {
        success: true,
        project,
    }))
}
