//! Error types for the room analysis core.
//!
//! A rejected photo is not an error: the quality gate reports it through
//! [`crate::quality_gate::GateVerdict`]. Errors here mean the image could not
//! be read at all.

use std::path::PathBuf;

/// Failures surfaced by the analysis core
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// Input is missing, unreadable, or not a valid raster image
    #[error("failed to decode image {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Decoded image has a zero-sized dimension
    #[error("image {} has no pixels ({width}x{height})", path.display())]
    Empty {
        path: PathBuf,
        width: u32,
        height: u32,
    },

    /// Reading the thresholds file failed
    #[error("failed to read parameters from {}: {source}", path.display())]
    Params {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl AnalysisError {
    /// True for failures that mean "this is not a usable image file"
    pub fn is_decode(&self) -> bool {
        matches!(self, AnalysisError::Decode { .. } | AnalysisError::Empty { .. })
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
