// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::detect::detect_handler;
use super::walkalong::{liveness_handler, walkalong_handler};
use crate::config::ServiceKind;
use crate::vision::{VisionModelManager, MAX_IMAGE_SIZE};

/// Request body cap; leaves room for base64 expansion of a maximum-size image
pub const MAX_BODY_BYTES: usize = MAX_IMAGE_SIZE * 4 / 3 + 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub vision_model_manager: Arc<VisionModelManager>,
}

impl AppState {
    pub fn new(vision_model_manager: Arc<VisionModelManager>) -> Self {
        Self {
            vision_model_manager,
        }
    }
}

/// Build the router for one service
///
/// `ServiceKind::All` mounts both services on one router; `main` instead
/// runs them as separate listeners.
pub fn build_router(state: AppState, service: ServiceKind) -> Router {
    let mut router = Router::new();

    if matches!(service, ServiceKind::Currency | ServiceKind::All) {
        router = router.route("/detect", post(detect_handler));
    }
    if matches!(service, ServiceKind::Walkalong | ServiceKind::All) {
        router = router
            .route("/", get(liveness_handler))
            .route("/walkalong", post(walkalong_handler));
    }

    router
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Serve `router` on `addr` until `shutdown` resolves
pub async fn start_server<F>(addr: SocketAddr, router: Router, shutdown: F) -> anyhow::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("API server listening on {}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
