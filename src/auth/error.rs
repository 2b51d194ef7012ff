// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet signature authentication errors.

use crate::error::AppError;

/// Reasons a signed request is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Signature or timestamp absent from the payload
    MissingSignature,
    /// Timestamp outside the validity window (past or future)
    SignatureExpired,
    /// Signature bytes could not be parsed or recovered
    InvalidSignature,
    /// Recovered signer differs from the claimed wallet
    WalletMismatch,
    /// Signature already consumed for this scope
    SignatureReused,
    /// Signer is authenticated but lacks the required role
    InsufficientPermissions,
    /// Replay store could not be consulted
    ReplayStore(String),
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingSignature => "missing_signature",
            AuthError::SignatureExpired => "signature_expired",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::WalletMismatch => "wallet_mismatch",
            AuthError::SignatureReused => "signature_reused",
            AuthError::InsufficientPermissions => "insufficient_permissions",
            AuthError::ReplayStore(_) => "replay_store_error",
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingSignature => write!(f, "Missing signature payload"),
            AuthError::SignatureExpired => write!(f, "Signature expired"),
            AuthError::InvalidSignature => write!(f, "Invalid signature"),
            AuthError::WalletMismatch => write!(f, "Signature does not match wallet"),
            AuthError::SignatureReused => write!(f, "Signature already used"),
            AuthError::InsufficientPermissions => {
                write!(f, "Forbidden: admin privileges required")
            }
            AuthError::ReplayStore(msg) => write!(f, "Replay store error: {msg}"),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingSignature => AppError::validation(err.to_string()),
            AuthError::InsufficientPermissions => AppError::authorization(err.to_string()),
            AuthError::ReplayStore(_) => AppError::internal(err.to_string()),
            _ => AppError::authentication(err.to_string()),
        }
    }
}
