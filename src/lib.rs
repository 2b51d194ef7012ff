// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! EcoChain - Carbon Credit Marketplace Backend
//!
//! Project owners submit carbon-offset projects signed with their wallet,
//! admins verify or reject them, and an off-chain indexer pushes minted,
//! transferred and retired credits to the sync endpoint. The marketplace
//! reads listings, statistics and retirement history from the same store.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum) and the router
//! - `auth` - Wallet signatures, replay protection, roles, rate limiting
//! - `security` - SSRF guard, input sanitizer, response headers
//! - `service` - Project submission/review and event sync logic
//! - `storage` - Embedded redb database and repositories
//! - `sweeper` - Background expiry of replay and rate-limit entries

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod security;
pub mod service;
pub mod state;
pub mod storage;
pub mod sweeper;
pub mod validation;

#[cfg(test)]
mod test_support;
