//! Tunable thresholds for the gate and the analysis passes.
//!
//! The defaults are calibrated constants; changing them changes which photos
//! are accepted and how they are classified.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::edges::EdgeThresholds;
use crate::error::{AnalysisError, Result};
use crate::hough::HoughParams;

/// Quality gate thresholds
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateParams {
    /// Minimum width in pixels (default: 200)
    pub min_width: u32,
    /// Minimum height in pixels (default: 200)
    pub min_height: u32,
    /// Minimum Laplacian variance, the focus proxy (default: 20)
    pub min_laplacian_variance: f64,
    /// Minimum fraction of edge pixels (default: 0.01)
    pub min_edge_ratio: f64,
    /// Canny thresholds for the structure check (default: 80, 150)
    pub edges: EdgeThresholds,
    /// Straight-line pass (default: votes 80, length 100, gap 20)
    pub lines: HoughParams,
}

impl Default for GateParams {
    fn default() -> Self {
        Self {
            min_width: 200,
            min_height: 200,
            min_laplacian_variance: 20.0,
            min_edge_ratio: 0.01,
            edges: EdgeThresholds::new(80, 150),
            lines: HoughParams::new(80, 100, 20),
        }
    }
}

/// Structural feature thresholds
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureParams {
    /// Height of the top band checked for a ceiling line (default: 0.2)
    pub ceiling_band: f64,
    /// Mean edge intensity in the band, 0-255 scale (default: 10)
    pub ceiling_min_mean: f64,
    /// Canny thresholds (default: 70, 150)
    pub edges: EdgeThresholds,
    /// Opening detection pass (default: votes 80, length 80, gap 10)
    pub openings: HoughParams,
}

impl Default for FeatureParams {
    fn default() -> Self {
        Self {
            ceiling_band: 0.2,
            ceiling_min_mean: 10.0,
            edges: EdgeThresholds::new(70, 150),
            openings: HoughParams::new(80, 80, 10),
        }
    }
}

/// All thresholds used by one analysis
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisParams {
    /// Canny thresholds behind the edge-density metric (default: 60, 140)
    pub density_edges: EdgeThresholds,
    pub gate: GateParams,
    pub features: FeatureParams,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            density_edges: EdgeThresholds::new(60, 140),
            gate: GateParams::default(),
            features: FeatureParams::default(),
        }
    }
}

impl AnalysisParams {
    /// Load from a TOML file; missing keys fall back to the defaults
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| AnalysisError::Params {
            path: path.to_path_buf(),
            source: Box::new(e),
        })?;
        toml::from_str(&content).map_err(|e| AnalysisError::Params {
            path: path.to_path_buf(),
            source: Box::new(e),
        })
    }
}
