// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Currency detection API endpoint module
//!
//! Provides POST /detect for recognizing banknotes and coins in a
//! base64-encoded image.

pub mod handler;
pub mod request;
pub mod response;

pub use handler::detect_handler;
pub use request::DetectRequest;
pub use response::{DetectResponse, DetectionItem};
