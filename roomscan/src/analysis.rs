//! Combines the feature, dimension, and state passes into one assessment.
//!
//! Callers are expected to have run the quality gate first; nothing here
//! re-validates the photo.

use log::debug;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::dimensions::{dimensions_for_density, Dimensions};
use crate::edges::{EdgeCache, EdgeMap};
use crate::error::Result;
use crate::features::{detect_with_cache, StructuralElement};
use crate::image_loader::{self, mean_brightness, PixelGrid};
use crate::params::AnalysisParams;
use crate::room_state::{lighting_for_brightness, state_for_density, FreeSpace, Lighting, RoomState};

/// Structured description of one room photo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomAssessment {
    pub room_state: RoomState,
    pub elements: Vec<StructuralElement>,
    pub free_space: FreeSpace,
    pub lighting: Lighting,
    pub dimensions: Dimensions,
}

impl RoomAssessment {
    /// Plain-text report, one field per line
    pub fn report(&self) -> String {
        let elements: Vec<String> = self
            .elements
            .iter()
            .map(|e| format!("- {e}"))
            .collect();
        format!(
            "Room Validity: Valid\n\
             Room State: {}\n\
             \n\
             Estimated Dimensions:\n\
             - Width: {}\n\
             - Depth: {}\n\
             - Area: {}\n\
             \n\
             Detected Elements:\n\
             {}\n\
             \n\
             Free Space: {}\n\
             Lighting: {}\n",
            self.room_state,
            self.dimensions.width,
            self.dimensions.depth,
            self.dimensions.area,
            elements.join("\n"),
            self.free_space,
            self.lighting,
        )
    }
}

/// Assessment plus the intermediate measurements behind it
#[derive(Debug, Clone)]
pub struct AnalysisOutput {
    pub assessment: RoomAssessment,
    pub edge_density: f64,
    pub brightness: f64,
    /// Every edge map computed during the analysis, for debug dumps
    pub edge_maps: Vec<EdgeMap>,
}

/// Load an image and analyze it with the default thresholds
pub fn analyze(path: impl AsRef<Path>) -> Result<RoomAssessment> {
    let grid = image_loader::load(path)?;
    Ok(analyze_grid(&grid, &AnalysisParams::default()))
}

pub fn analyze_grid(grid: &PixelGrid, params: &AnalysisParams) -> RoomAssessment {
    analyze_detailed(grid, params).assessment
}

pub fn analyze_detailed(grid: &PixelGrid, params: &AnalysisParams) -> AnalysisOutput {
    let gray = grid.luminance();
    let mut cache = EdgeCache::new(&gray);

    let brightness = mean_brightness(&gray);
    let lighting = lighting_for_brightness(brightness);

    let edge_density = cache.edges(params.density_edges).density();
    let (room_state, free_space) = state_for_density(edge_density);
    let dimensions = dimensions_for_density(edge_density);

    let elements = detect_with_cache(&mut cache, &params.features);

    debug!(
        "Analysis: brightness={brightness:.1} density={edge_density:.4} edge maps={}",
        cache.len()
    );

    let edge_maps = cache.maps().into_iter().cloned().collect();

    AnalysisOutput {
        assessment: RoomAssessment {
            room_state,
            elements,
            free_space,
            lighting,
            dimensions,
        },
        edge_density,
        brightness,
        edge_maps,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgb, RgbImage};

    fn grid(img: RgbImage) -> PixelGrid {
        PixelGrid::from_dynamic(DynamicImage::ImageRgb8(img), Path::new("test")).unwrap()
    }

    #[test]
    fn test_blank_bright_room() {
        let out = analyze_detailed(
            &grid(RgbImage::from_pixel(300, 240, Rgb([230, 230, 230]))),
            &AnalysisParams::default(),
        );
        let a = out.assessment;
        assert_eq!(a.room_state, RoomState::Empty);
        assert_eq!(a.free_space, FreeSpace::High);
        assert_eq!(a.lighting, Lighting::Bright);
        assert_eq!(a.elements, vec![StructuralElement::Walls, StructuralElement::Floor]);
        assert_eq!(a.dimensions.area, "27.0 sqm");
        assert_eq!(out.edge_density, 0.0);
        // One map for density, one for features
        assert_eq!(out.edge_maps.len(), 2);
    }

    #[test]
    fn test_cluttered_room_is_furnished() {
        let img = RgbImage::from_fn(300, 300, |x, y| {
            if (x / 5 + y / 5) % 2 == 0 {
                Rgb([20, 20, 20])
            } else {
                Rgb([235, 235, 235])
            }
        });
        let a = analyze_grid(&grid(img), &AnalysisParams::default());
        assert_eq!(a.room_state, RoomState::Furnished);
        assert_eq!(a.free_space, FreeSpace::Low);
        assert_eq!(a.dimensions.width, "3.5 m (approx)");
    }

    #[test]
    fn test_fine_low_contrast_texture_counts_as_furniture() {
        let img = RgbImage::from_fn(400, 300, |x, _| {
            if (x / 4) % 2 == 0 {
                Rgb([100, 100, 100])
            } else {
                Rgb([160, 160, 160])
            }
        });
        let out = analyze_detailed(&grid(img), &AnalysisParams::default());
        assert!((out.edge_density - 0.2475).abs() < 1e-9);
        let a = out.assessment;
        assert_eq!(a.room_state, RoomState::Furnished);
        assert_eq!(a.free_space, FreeSpace::Low);
        assert_eq!(a.dimensions.width, "3.5 m (approx)");
        assert_eq!(a.dimensions.area, "10.5 sqm");
    }

    #[test]
    fn test_report_lists_every_field() {
        let assessment = RoomAssessment {
            room_state: RoomState::Furnished,
            elements: vec![
                StructuralElement::Walls,
                StructuralElement::Floor,
                StructuralElement::WindowsDoors,
            ],
            free_space: FreeSpace::Medium,
            lighting: Lighting::Moderate,
            dimensions: dimensions_for_density(0.04),
        };
        let report = assessment.report();
        assert!(report.starts_with("Room Validity: Valid\nRoom State: Furnished\n"));
        assert!(report.contains("- Width: 4.5 m (approx)\n"));
        assert!(report.contains("- Area: 18.0 sqm\n"));
        assert!(report.contains("- walls\n- floor\n- windows/doors\n"));
        assert!(report.contains("Free Space: medium\n"));
        assert!(report.ends_with("Lighting: moderate\n"));
    }

    #[test]
    fn test_assessment_serializes_to_toml() {
        let assessment = analyze_grid(
            &grid(RgbImage::from_pixel(220, 220, Rgb([50, 50, 50]))),
            &AnalysisParams::default(),
        );
        let text = toml::to_string(&assessment).unwrap();
        assert!(text.contains("room_state = \"Empty\""));
        assert!(text.contains("lighting = \"dim\""));
        assert!(text.contains("elements = [\"walls\", \"floor\"]"));
    }
}
