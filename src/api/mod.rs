// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod detect;
pub mod errors;
pub mod http_server;
pub mod walkalong;

pub use detect::{detect_handler, DetectRequest, DetectResponse, DetectionItem};
pub use errors::{ApiError, ErrorResponse};
pub use http_server::{build_router, start_server, AppState, MAX_BODY_BYTES};
pub use walkalong::{
    liveness_handler, walkalong_handler, ObstacleItem, WalkAlongResponse, LIVENESS_MESSAGE,
};
