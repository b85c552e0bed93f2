//! Approximate room size from edge density.
//!
//! Sparse edges suggest a large, mostly empty room; dense edges a small,
//! cluttered one. The bins are a fixed lookup, not an interpolation.

use serde::{Deserialize, Serialize};

use crate::edges::{EdgeCache, EdgeThresholds};
use crate::image_loader::PixelGrid;

/// Width and depth in metres for one density bin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoomSize {
    pub width_m: f64,
    pub depth_m: f64,
}

impl RoomSize {
    const fn new(width_m: f64, depth_m: f64) -> Self {
        Self { width_m, depth_m }
    }

    /// Floor area rounded to one decimal
    pub fn area_sqm(&self) -> f64 {
        (self.width_m * self.depth_m * 10.0).round() / 10.0
    }
}

/// (exclusive upper bound on density, size); first match wins
const SIZE_RULES: [(f64, RoomSize); 3] = [
    (0.03, RoomSize::new(6.0, 4.5)),
    (0.06, RoomSize::new(4.5, 4.0)),
    (f64::INFINITY, RoomSize::new(3.5, 3.0)),
];

/// Display strings for the estimated size
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: String,
    pub depth: String,
    pub area: String,
}

impl From<RoomSize> for Dimensions {
    fn from(size: RoomSize) -> Self {
        Self {
            width: format!("{:.1} m (approx)", size.width_m),
            depth: format!("{:.1} m (approx)", size.depth_m),
            area: format!("{:.1} sqm", size.area_sqm()),
        }
    }
}

pub fn size_for_density(density: f64) -> RoomSize {
    SIZE_RULES
        .iter()
        .find(|(upper, _)| density < *upper)
        .map(|(_, size)| *size)
        .unwrap_or(SIZE_RULES[SIZE_RULES.len() - 1].1)
}

pub fn dimensions_for_density(density: f64) -> Dimensions {
    size_for_density(density).into()
}

pub fn estimate_dimensions(grid: &PixelGrid, thresholds: EdgeThresholds) -> Dimensions {
    let gray = grid.luminance();
    let density = EdgeCache::new(&gray).edges(thresholds).density();
    dimensions_for_density(density)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bins() {
        assert_eq!(size_for_density(0.02), RoomSize::new(6.0, 4.5));
        assert_eq!(size_for_density(0.04), RoomSize::new(4.5, 4.0));
        assert_eq!(size_for_density(0.08), RoomSize::new(3.5, 3.0));
        assert_eq!(size_for_density(0.0), RoomSize::new(6.0, 4.5));
        assert_eq!(size_for_density(1.0), RoomSize::new(3.5, 3.0));
    }

    #[test]
    fn test_boundaries_are_half_open() {
        assert_eq!(size_for_density(0.03), RoomSize::new(4.5, 4.0));
        assert_eq!(size_for_density(0.06), RoomSize::new(3.5, 3.0));
        assert_eq!(size_for_density(0.029_999), RoomSize::new(6.0, 4.5));
        assert_eq!(size_for_density(0.059_999), RoomSize::new(4.5, 4.0));
    }

    #[test]
    fn test_areas() {
        assert_eq!(size_for_density(0.02).area_sqm(), 27.0);
        assert_eq!(size_for_density(0.04).area_sqm(), 18.0);
        assert_eq!(size_for_density(0.08).area_sqm(), 10.5);
    }

    #[test]
    fn test_display_strings() {
        let dims = dimensions_for_density(0.08);
        assert_eq!(dims.width, "3.5 m (approx)");
        assert_eq!(dims.depth, "3.0 m (approx)");
        assert_eq!(dims.area, "10.5 sqm");

        let dims = dimensions_for_density(0.01);
        assert_eq!(dims.width, "6.0 m (approx)");
        assert_eq!(dims.area, "27.0 sqm");
    }
}
