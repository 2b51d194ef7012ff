// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Application error taxonomy and its HTTP mapping.
//!
//! | Variant | Status | Code |
//! |---------|--------|------|
//! | `Validation` | 400 | `VALIDATION_ERROR` |
//! | `Authentication` | 401 | `AUTH_ERROR` |
//! | `Authorization` | 403 | `FORBIDDEN` |
//! | `NotFound` | 404 | `NOT_FOUND` |
//! | `App` | custom | custom |
//! | `Internal` | 500 | `INTERNAL_ERROR` |
//!
//! Internal errors are logged and never echoed to the caller.

use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::storage::DbError;

/// Field name → list of problems with that field.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Message returned for any error that is not safe to expose.
pub const GENERIC_ERROR_MESSAGE: &str = "Internal server error";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// User input is malformed.
    #[error("{message}")]
    Validation {
        message: String,
        details: Option<FieldErrors>,
    },
    /// Signature missing, expired, invalid, mismatched or replayed.
    #[error("{0}")]
    Authentication(String),
    /// Caller lacks the required role.
    #[error("{0}")]
    Authorization(String),
    #[error("{0}")]
    NotFound(String),
    /// Structured application error with a machine-readable code.
    #[error("{message}")]
    App {
        message: String,
        code: &'static str,
        status: StatusCode,
    },
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation {
            message: message.into(),
            details: None,
        }
    }

    pub fn validation_with(message: impl Into<String>, details: FieldErrors) -> Self {
        AppError::Validation {
            message: message.into(),
            details: Some(details),
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        AppError::Authentication(message.into())
    }

    pub fn authorization(message: impl Into<String>) -> Self {
        AppError::Authorization(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        AppError::NotFound(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        AppError::Internal(message.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation { .. } => "VALIDATION_ERROR",
            AppError::Authentication(_) => "AUTH_ERROR",
            AppError::Authorization(_) => "FORBIDDEN",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::App { code, .. } => *code,
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::Authentication(_) => StatusCode::UNAUTHORIZED,
            AppError::Authorization(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::App { status, .. } => *status,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the message may be shown to the caller verbatim.
    pub fn is_expected(&self) -> bool {
        !matches!(self, AppError::Internal(_))
    }

    pub fn details(&self) -> Option<&FieldErrors> {
        match self {
            AppError::Validation { details, .. } => details.as_ref(),
            _ => None,
        }
    }
}

impl From<DbError> for AppError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound(what) => AppError::NotFound(format!("{what} not found")),
            err @ DbError::InvalidTransition { .. } => AppError::App {
                message: err.to_string(),
                code: "INVALID_STATUS_TRANSITION",
                status: StatusCode::CONFLICT,
            },
            other => AppError::Internal(other.to_string()),
        }
    }
}

/// JSON error body: `{success: false, error, code, details?}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<FieldErrors>,
}

impl ErrorBody {
    /// Build the body for `err`, substituting `generic` for unexpected errors.
    pub fn from_error(err: &AppError, generic: &str) -> Self {
        let error = if err.is_expected() {
            err.to_string()
        } else {
            generic.to_string()
        };
        Self {
            success: false,
            error,
            code: err.code().to_string(),
            details: err.details().cloned(),
        }
    }
}

/// An `AppError` rendered as an HTTP response.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl ApiError {
    /// Convert an application error, hiding internals behind `generic`.
    pub fn with_generic(err: AppError, generic: &str) -> Self {
        match &err {
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Unexpected error while handling request");
            }
            AppError::App { code, .. } => {
                tracing::warn!(error = %err, code = %code, "Application error");
            }
            _ => {}
        }
        Self {
            status: err.status_code(),
            body: ErrorBody::from_error(&err, generic),
        }
    }

    pub fn new(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                success: false,
                error: message.into(),
                code: code.to_string(),
                details: None,
            },
        }
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self::with_generic(err, GENERIC_ERROR_MESSAGE)
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        AppError::from(err).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
