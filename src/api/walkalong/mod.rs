// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Walk-along API endpoint module
//!
//! Provides POST /walkalong for detecting obstacles with estimated
//! distances in an uploaded image, and GET / as a liveness check.

pub mod handler;
pub mod response;

pub use handler::{liveness_handler, walkalong_handler, LIVENESS_MESSAGE};
pub use response::{ObstacleItem, WalkAlongResponse};
