// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use clap::Parser;
use std::{env, sync::Arc};
use tokio::{signal, sync::watch};
use walkalong_node::{
    api::{build_router, start_server, AppState},
    config::{ServiceConfig, ServiceKind},
    version,
    vision::VisionModelManager,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    let config = ServiceConfig::parse();

    tracing::info!("🚀 Starting {}", version::get_version_string());
    tracing::info!("📦 BUILD VERSION: {}", version::VERSION);
    tracing::info!("Service: {:?}", config.service);

    let manager = VisionModelManager::new(config.vision_model_config())
        .await
        .context("Failed to load vision models")?;
    for model in manager.list_models() {
        if model.available {
            tracing::info!("  {} ({})", model.name, model.model_type);
        }
    }
    let state = AppState::new(Arc::new(manager));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Shutting down...");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => {
                tracing::warn!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
        }
    });

    let mut servers = Vec::new();
    if config.service.runs_currency() {
        let router = build_router(state.clone(), ServiceKind::Currency);
        servers.push(start_server(
            config.detect_addr()?,
            router,
            wait_for(shutdown_rx.clone()),
        ));
    }
    if config.service.runs_walkalong() {
        let router = build_router(state.clone(), ServiceKind::Walkalong);
        servers.push(start_server(
            config.walkalong_addr()?,
            router,
            wait_for(shutdown_rx.clone()),
        ));
    }

    futures::future::try_join_all(servers).await?;

    tracing::info!("✅ Stopped");
    Ok(())
}

async fn wait_for(mut shutdown: watch::Receiver<bool>) {
    while !*shutdown.borrow() {
        if shutdown.changed().await.is_err() {
            break;
        }
    }
}
