// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Walk-along response types

use serde::{Deserialize, Serialize};

use crate::vision::Obstacle;

/// A detected obstacle and its estimated distance
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ObstacleItem {
    pub label: String,
    /// Depth value at the box center, rounded to 2 decimals
    pub distance: f64,
}

impl From<Obstacle> for ObstacleItem {
    fn from(obstacle: Obstacle) -> Self {
        Self {
            label: obstacle.label,
            distance: obstacle.distance,
        }
    }
}

/// Body of a successful `POST /walkalong`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WalkAlongResponse {
    pub obstacles: Vec<ObstacleItem>,
}

impl WalkAlongResponse {
    pub fn new(obstacles: Vec<Obstacle>) -> Self {
        Self {
            obstacles: obstacles.into_iter().map(ObstacleItem::from).collect(),
        }
    }
}
