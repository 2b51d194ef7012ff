// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Wallet-signature authentication for the EcoChain API.
//!
//! ## Auth Flow
//!
//! 1. Frontend builds the canonical message for an action scope
//!    (`EcoChain:<scope>:<wallet>:<timestamp>`)
//! 2. The user's wallet signs it with `personal_sign`
//! 3. The server:
//!    - Rejects timestamps more than 5 minutes from now (either direction)
//!    - Recovers the signer and compares it to the claimed wallet
//!    - Consumes `(signature, scope)` in the replay store
//!
//! ## Security
//!
//! - Replay protection is per process unless a shared [`ReplayStore`] is injected
//! - API routes are rate limited per client IP
//! - The sync endpoint is protected by a static API key

pub mod api_key;
pub mod error;
pub mod message;
pub mod rate_limit;
pub mod replay;
pub mod roles;
pub mod signature;

pub use error::AuthError;
pub use message::{build_auth_message, Scope};
pub use rate_limit::RateLimiter;
pub use replay::{InMemoryReplayStore, ReplayStore};
pub use roles::Role;
pub use signature::{AuthRequest, SignatureVerifier};
