// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Context;
use rusqlite::Connection;

use super::{AppState, create_router};
use crate::config::Config;

/// Serves the API until Ctrl-C.
pub async fn run_server(conn: Connection, config: &Config) -> anyhow::Result<()> {
    let app = create_router(AppState::new(conn), &config.cors_origin);

    let listener = tokio::net::TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("Bind {}", config.listen))?;
    tracing::info!(
        addr = %config.listen,
        db = %config.db_path.display(),
        cors_origin = %config.cors_origin,
        "starting server"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
