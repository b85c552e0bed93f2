//! Furnishing state, free space, and lighting classification.
//!
//! Both classifiers are ordered rule tables over a single scalar. The density
//! table shares its cut points with the dimension estimator but only
//! distinguishes two states: the sparse bin is `Empty`, everything else is
//! `Furnished`. So `Empty` always pairs with `High` free space.

use serde::{Deserialize, Serialize};

use crate::edges::{EdgeCache, EdgeThresholds};
use crate::image_loader::{mean_brightness, PixelGrid};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomState {
    Empty,
    Furnished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FreeSpace {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lighting {
    Bright,
    Moderate,
    Dim,
}

impl std::fmt::Display for RoomState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            RoomState::Empty => "Empty",
            RoomState::Furnished => "Furnished",
        })
    }
}

impl std::fmt::Display for FreeSpace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            FreeSpace::High => "high",
            FreeSpace::Medium => "medium",
            FreeSpace::Low => "low",
        })
    }
}

impl std::fmt::Display for Lighting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Lighting::Bright => "bright",
            Lighting::Moderate => "moderate",
            Lighting::Dim => "dim",
        })
    }
}

/// (exclusive upper bound on edge density, outcome)
const STATE_RULES: [(f64, RoomState, FreeSpace); 3] = [
    (0.03, RoomState::Empty, FreeSpace::High),
    (0.06, RoomState::Furnished, FreeSpace::Medium),
    (f64::INFINITY, RoomState::Furnished, FreeSpace::Low),
];

/// (exclusive lower bound on mean luminance, outcome)
const LIGHTING_RULES: [(f64, Lighting); 3] = [
    (170.0, Lighting::Bright),
    (100.0, Lighting::Moderate),
    (f64::NEG_INFINITY, Lighting::Dim),
];

pub fn state_for_density(density: f64) -> (RoomState, FreeSpace) {
    STATE_RULES
        .iter()
        .find(|(upper, _, _)| density < *upper)
        .map(|&(_, state, space)| (state, space))
        .unwrap_or((RoomState::Furnished, FreeSpace::Low))
}

pub fn lighting_for_brightness(mean: f64) -> Lighting {
    LIGHTING_RULES
        .iter()
        .find(|(lower, _)| mean > *lower)
        .map(|&(_, lighting)| lighting)
        .unwrap_or(Lighting::Dim)
}

pub fn classify_state(grid: &PixelGrid, thresholds: EdgeThresholds) -> (RoomState, FreeSpace) {
    let gray = grid.luminance();
    let density = EdgeCache::new(&gray).edges(thresholds).density();
    state_for_density(density)
}

pub fn classify_lighting(grid: &PixelGrid) -> Lighting {
    lighting_for_brightness(mean_brightness(&grid.luminance()))
}
