// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is loaded from the environment
//! once at startup into [`AppConfig`].
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `DATA_DIR` | Directory holding the embedded database | `./data` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `SYNC_API_KEY` | API key required by `/api/sync` | Required for sync |
//! | `ECOCHAIN_ADMIN_WALLETS` | Comma-separated wallets granted the admin role | empty |
//! | `NETWORK_NAME` | Chain name reported by `/api/network` | `polygon-amoy` |
//! | `CHAIN_ID` | Chain id reported by `/api/network` | `80002` |
//! | `CREDITS_CONTRACT_ADDRESS` | Carbon credit token contract | Optional |
//! | `MARKETPLACE_CONTRACT_ADDRESS` | Marketplace contract | Optional |
//! | `RATE_LIMIT_MAX_REQUESTS` | Requests allowed per client per window | `30` |
//! | `RATE_LIMIT_WINDOW_SECS` | Rate limit window length | `60` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable name for the data directory path.
pub const DATA_DIR_ENV: &str = "DATA_DIR";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
/// API key guarding the blockchain sync endpoint.
pub const SYNC_API_KEY_ENV: &str = "SYNC_API_KEY";
/// Wallets that are upserted with the admin role at startup.
pub const ADMIN_WALLETS_ENV: &str = "ECOCHAIN_ADMIN_WALLETS";
pub const NETWORK_NAME_ENV: &str = "NETWORK_NAME";
pub const CHAIN_ID_ENV: &str = "CHAIN_ID";
pub const CREDITS_CONTRACT_ENV: &str = "CREDITS_CONTRACT_ADDRESS";
pub const MARKETPLACE_CONTRACT_ENV: &str = "MARKETPLACE_CONTRACT_ADDRESS";
pub const RATE_LIMIT_MAX_ENV: &str = "RATE_LIMIT_MAX_REQUESTS";
pub const RATE_LIMIT_WINDOW_ENV: &str = "RATE_LIMIT_WINDOW_SECS";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

const DEFAULT_DATA_DIR: &str = "./data";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_NETWORK_NAME: &str = "polygon-amoy";
const DEFAULT_CHAIN_ID: u64 = 80002;
const DEFAULT_RATE_LIMIT_MAX: u32 = 30;
const DEFAULT_RATE_LIMIT_WINDOW: Duration = Duration::from_secs(60);

/// Validity window of a signed auth message, in both directions around now.
pub const SIGNATURE_WINDOW: Duration = Duration::from_secs(5 * 60);

/// Chain and contract settings surfaced to clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    pub name: String,
    pub chain_id: u64,
    pub credits_contract: Option<String>,
    pub marketplace_contract: Option<String>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_NETWORK_NAME.to_string(),
            chain_id: DEFAULT_CHAIN_ID,
            credits_contract: None,
            marketplace_contract: None,
        }
    }
}

/// Fixed-window rate limit settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: DEFAULT_RATE_LIMIT_MAX,
            window: DEFAULT_RATE_LIMIT_WINDOW,
        }
    }
}

/// Application configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub host: String,
    pub port: u16,
    pub sync_api_key: Option<String>,
    pub admin_wallets: Vec<String>,
    pub network: NetworkConfig,
    pub rate_limit: RateLimitConfig,
    pub signature_window: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            sync_api_key: None,
            admin_wallets: Vec::new(),
            network: NetworkConfig::default(),
            rate_limit: RateLimitConfig::default(),
            signature_window: SIGNATURE_WINDOW,
        }
    }
}

impl AppConfig {
    /// Load configuration from the process environment.
    ///
    /// Unparseable numeric values fall back to their defaults with a warning.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let port = parse_or(PORT_ENV, defaults.port);
        let chain_id = parse_or(CHAIN_ID_ENV, defaults.network.chain_id);
        let max_requests = parse_or(RATE_LIMIT_MAX_ENV, defaults.rate_limit.max_requests);
        let window_secs = parse_or(RATE_LIMIT_WINDOW_ENV, defaults.rate_limit.window.as_secs());

        Self {
            data_dir: non_empty(DATA_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            host: non_empty(HOST_ENV).unwrap_or(defaults.host),
            port,
            sync_api_key: non_empty(SYNC_API_KEY_ENV),
            admin_wallets: non_empty(ADMIN_WALLETS_ENV)
                .map(|raw| parse_wallet_list(&raw))
                .unwrap_or_default(),
            network: NetworkConfig {
                name: non_empty(NETWORK_NAME_ENV).unwrap_or(defaults.network.name),
                chain_id,
                credits_contract: non_empty(CREDITS_CONTRACT_ENV),
                marketplace_contract: non_empty(MARKETPLACE_CONTRACT_ENV),
            },
            rate_limit: RateLimitConfig {
                max_requests,
                window: Duration::from_secs(window_secs.max(1)),
            },
            signature_window: SIGNATURE_WINDOW,
        }
    }

    /// Path to the redb database file inside the data directory.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("ecochain.redb")
    }
}

fn non_empty(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_or<T: std::str::FromStr + Copy + std::fmt::Display>(name: &str, default: T) -> T {
    match non_empty(name) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(variable = name, value = %raw, default = %default, "Invalid value, using default");
            default
        }),
        None => default,
    }
}

/// Split a comma-separated wallet list, lowercasing and dropping blanks.
pub fn parse_wallet_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|w| w.trim().to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wallet_list_is_normalized() {
        let wallets = parse_wallet_list(" 0xABC , ,0xdef,");
        assert_eq!(wallets, vec!["0xabc".to_string(), "0xdef".to_string()]);
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = AppConfig::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.rate_limit.max_requests, 30);
        assert_eq!(config.rate_limit.window, Duration::from_secs(60));
        assert_eq!(config.signature_window, Duration::from_secs(300));
        assert!(config.database_path().ends_with("ecochain.redb"));
    }
}
