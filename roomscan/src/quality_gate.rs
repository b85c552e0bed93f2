//! Quality gate: decides whether a photo is usable as an indoor room image.
//!
//! The checks run in order and the first failure rejects the photo:
//! size, focus (Laplacian variance), edge content, then at least one long
//! straight line. A rejection is an expected outcome, not an error.

use log::debug;
use serde::Serialize;
use std::path::Path;

use crate::edges::{laplacian_variance, EdgeCache};
use crate::hough::detect_segments;
use crate::image_loader::{self, PixelGrid};
use crate::params::GateParams;

/// Why a photo was turned away
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    TooSmall,
    TooBlurry,
    TooFewEdges,
    NoStraightLines,
}

impl RejectionReason {
    pub fn describe(&self) -> &'static str {
        match self {
            RejectionReason::TooSmall => "image is smaller than the minimum size",
            RejectionReason::TooBlurry => "image is out of focus",
            RejectionReason::TooFewEdges => "image has too little structure",
            RejectionReason::NoStraightLines => "no straight structural lines found",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", content = "reason", rename_all = "snake_case")]
pub enum GateVerdict {
    Accepted,
    Rejected(RejectionReason),
}

impl GateVerdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, GateVerdict::Accepted)
    }
}

/// Statistics measured by the gate. Checks after the failing one are not run,
/// so their fields stay `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GateReport {
    pub width: u32,
    pub height: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub laplacian_variance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edge_ratio: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_count: Option<usize>,
    #[serde(flatten)]
    pub verdict: GateVerdict,
}

impl GateReport {
    fn new(grid: &PixelGrid) -> Self {
        Self {
            width: grid.width(),
            height: grid.height(),
            laplacian_variance: None,
            edge_ratio: None,
            line_count: None,
            verdict: GateVerdict::Accepted,
        }
    }

    fn reject(mut self, reason: RejectionReason) -> Self {
        self.verdict = GateVerdict::Rejected(reason);
        self
    }
}

/// Run every check against a decoded image
pub fn evaluate(grid: &PixelGrid, params: &GateParams) -> GateReport {
    let report = GateReport::new(grid);

    if grid.height() < params.min_height || grid.width() < params.min_width {
        return report.reject(RejectionReason::TooSmall);
    }

    let gray = grid.luminance();
    evaluate_luminance(&mut EdgeCache::new(&gray), report, params)
}

fn evaluate_luminance(
    cache: &mut EdgeCache<'_>,
    mut report: GateReport,
    params: &GateParams,
) -> GateReport {
    let variance = laplacian_variance(cache.gray());
    report.laplacian_variance = Some(variance);
    if variance < params.min_laplacian_variance {
        return report.reject(RejectionReason::TooBlurry);
    }

    let edges = cache.edges(params.edges);
    let edge_ratio = edges.density();
    report.edge_ratio = Some(edge_ratio);
    if edge_ratio < params.min_edge_ratio {
        return report.reject(RejectionReason::TooFewEdges);
    }

    // Presence is all that matters, so stop at the first segment
    let lines = detect_segments(edges, &params.lines, Some(1));
    report.line_count = Some(lines.len());
    if lines.is_empty() {
        return report.reject(RejectionReason::NoStraightLines);
    }

    report
}

/// Load and check an image file. Decode failures count as rejections.
pub fn is_valid_room_image(path: impl AsRef<Path>) -> bool {
    is_valid_room_image_with(path, &GateParams::default())
}

pub fn is_valid_room_image_with(path: impl AsRef<Path>, params: &GateParams) -> bool {
    let path = path.as_ref();
    let grid = match image_loader::load(path) {
        Ok(grid) => grid,
        Err(e) => {
            debug!("Rejecting {}: {e}", path.display());
            return false;
        }
    };
    let report = evaluate(&grid, params);
    if let GateVerdict::Rejected(reason) = report.verdict {
        debug!("Rejecting {}: {}", path.display(), reason.describe());
    }
    report.verdict.is_accepted()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgb, RgbImage};

    fn grid(img: RgbImage) -> PixelGrid {
        PixelGrid::from_dynamic(DynamicImage::ImageRgb8(img), Path::new("test")).unwrap()
    }

    fn room_like(width: u32, height: u32) -> RgbImage {
        // Vertical panels of alternating tone, split by a floor line
        RgbImage::from_fn(width, height, |x, y| {
            let base = if (x / 40) % 2 == 0 { 60 } else { 200 };
            let v = if y > height * 2 / 3 { base / 2 } else { base };
            Rgb([v, v, v])
        })
    }

    #[test]
    fn test_small_image_rejected_before_other_checks() {
        let report = evaluate(&grid(room_like(199, 400)), &GateParams::default());
        assert_eq!(report.verdict, GateVerdict::Rejected(RejectionReason::TooSmall));
        assert!(report.laplacian_variance.is_none());

        let report = evaluate(&grid(room_like(400, 150)), &GateParams::default());
        assert_eq!(report.verdict, GateVerdict::Rejected(RejectionReason::TooSmall));
    }

    #[test]
    fn test_flat_image_rejected_as_blurry() {
        let report = evaluate(
            &grid(RgbImage::from_pixel(300, 300, Rgb([255, 255, 255]))),
            &GateParams::default(),
        );
        assert_eq!(report.verdict, GateVerdict::Rejected(RejectionReason::TooBlurry));
        assert_eq!(report.laplacian_variance, Some(0.0));
    }

    #[test]
    fn test_sparse_noise_rejected_for_edges() {
        // Isolated single-pixel dots: sharp, but almost no Canny edges
        let img = RgbImage::from_fn(300, 300, |x, y| {
            if x % 50 == 0 && y % 50 == 0 {
                Rgb([255, 255, 255])
            } else {
                Rgb([0, 0, 0])
            }
        });
        let params = GateParams {
            min_laplacian_variance: 0.0,
            ..Default::default()
        };
        let report = evaluate(&grid(img), &params);
        assert_eq!(
            report.verdict,
            GateVerdict::Rejected(RejectionReason::TooFewEdges)
        );
    }

    #[test]
    fn test_room_like_image_accepted() {
        let report = evaluate(&grid(room_like(400, 300)), &GateParams::default());
        assert_eq!(report.verdict, GateVerdict::Accepted);
        assert!(report.laplacian_variance.unwrap() >= 20.0);
        assert!(report.edge_ratio.unwrap() >= 0.01);
        assert_eq!(report.line_count, Some(1));
    }

    #[test]
    fn test_missing_file_is_not_valid() {
        assert!(!is_valid_room_image("/definitely/not/here.jpg"));
    }

    #[test]
    fn test_verdict_serializes_with_reason() {
        let value = toml::Value::try_from(
            GateReport::new(&grid(room_like(10, 10))).reject(RejectionReason::TooBlurry),
        )
        .unwrap();
        assert_eq!(value["verdict"].as_str(), Some("rejected"));
        assert_eq!(value["reason"].as_str(), Some("too_blurry"));
    }
}
