// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::process::ExitCode;
use std::sync::Arc;

use ecochain_server::{
    api::router,
    auth::{InMemoryReplayStore, ReplayStore, Role},
    config::AppConfig,
    logging::{self, LogFormat},
    state::AppState,
    storage::Database,
    sweeper::Sweeper,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> ExitCode {
    logging::init(LogFormat::from_env());

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Server exited with error");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env();

    let db_path = config.database_path();
    let db = Database::open(&db_path)?;
    tracing::info!(path = %db_path.display(), "Database opened");

    for wallet in &config.admin_wallets {
        let user = db.users().set_role(wallet, Role::Admin)?;
        tracing::info!(wallet = %user.wallet_address, "Granted admin role");
    }

    if config.sync_api_key.is_none() {
        tracing::warn!("SYNC_API_KEY is not set; /api/sync will answer 503");
    }

    let replay: Arc<dyn ReplayStore> = Arc::new(InMemoryReplayStore::new());
    let sweep_interval = config.signature_window;
    let addr = format!("{}:{}", config.host, config.port);

    let state = AppState::new(config, db, Arc::clone(&replay));

    let shutdown = CancellationToken::new();
    let sweeper = Sweeper::new(replay, Arc::clone(&state.rate_limiter), sweep_interval);
    let sweeper_handle = tokio::spawn(sweeper.run(shutdown.clone()));

    let app = router(state);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "EcoChain server listening (docs at /docs)");

    let serve_result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    shutdown.cancel();
    if let Err(e) = sweeper_handle.await {
        tracing::warn!(error = %e, "Sweeper task did not stop cleanly");
    }

    serve_result?;
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
