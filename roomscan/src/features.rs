//! Coarse structural elements inferred from edge content.

use serde::{Deserialize, Serialize};

use crate::edges::EdgeCache;
use crate::hough::has_line;
use crate::image_loader::PixelGrid;
use crate::params::FeatureParams;

/// Structural tags, declared in reporting order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StructuralElement {
    #[serde(rename = "walls")]
    Walls,
    #[serde(rename = "floor")]
    Floor,
    #[serde(rename = "ceiling")]
    Ceiling,
    #[serde(rename = "windows/doors")]
    WindowsDoors,
}

impl StructuralElement {
    pub fn as_str(&self) -> &'static str {
        match self {
            StructuralElement::Walls => "walls",
            StructuralElement::Floor => "floor",
            StructuralElement::Ceiling => "ceiling",
            StructuralElement::WindowsDoors => "windows/doors",
        }
    }
}

impl std::fmt::Display for StructuralElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Walls and floor are assumed for any accepted photo; ceiling and openings
/// are added when the edge evidence supports them.
pub fn detect_features(grid: &PixelGrid, params: &FeatureParams) -> Vec<StructuralElement> {
    let gray = grid.luminance();
    detect_with_cache(&mut EdgeCache::new(&gray), params)
}

pub(crate) fn detect_with_cache(
    cache: &mut EdgeCache<'_>,
    params: &FeatureParams,
) -> Vec<StructuralElement> {
    let mut elements = vec![StructuralElement::Walls, StructuralElement::Floor];

    let edges = cache.edges(params.edges);
    if edges.band_mean(params.ceiling_band) > params.ceiling_min_mean {
        elements.push(StructuralElement::Ceiling);
    }
    if has_line(edges, &params.openings) {
        elements.push(StructuralElement::WindowsDoors);
    }

    elements
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgb, RgbImage};
    use std::path::Path;

    fn grid(img: RgbImage) -> PixelGrid {
        PixelGrid::from_dynamic(DynamicImage::ImageRgb8(img), Path::new("test")).unwrap()
    }

    #[test]
    fn test_blank_image_only_walls_and_floor() {
        let elements = detect_features(
            &grid(RgbImage::from_pixel(300, 300, Rgb([120, 120, 120]))),
            &FeatureParams::default(),
        );
        assert_eq!(
            elements,
            vec![StructuralElement::Walls, StructuralElement::Floor]
        );
    }

    #[test]
    fn test_busy_top_band_adds_ceiling_and_openings() {
        // Dense vertical stripes across the whole frame
        let img = RgbImage::from_fn(300, 300, |x, _| {
            if (x / 6) % 2 == 0 {
                Rgb([30, 30, 30])
            } else {
                Rgb([220, 220, 220])
            }
        });
        let elements = detect_features(&grid(img), &FeatureParams::default());
        assert_eq!(
            elements,
            vec![
                StructuralElement::Walls,
                StructuralElement::Floor,
                StructuralElement::Ceiling,
                StructuralElement::WindowsDoors,
            ]
        );
    }

    #[test]
    fn test_opening_without_ceiling() {
        // One tall door frame in the lower part of the frame
        let img = RgbImage::from_fn(300, 300, |x, y| {
            if (120..180).contains(&x) && y > 100 {
                Rgb([20, 20, 20])
            } else {
                Rgb([200, 200, 200])
            }
        });
        let elements = detect_features(&grid(img), &FeatureParams::default());
        assert_eq!(
            elements,
            vec![
                StructuralElement::Walls,
                StructuralElement::Floor,
                StructuralElement::WindowsDoors,
            ]
        );
    }

    #[test]
    fn test_order_is_declaration_order_and_unique() {
        let img = RgbImage::from_fn(260, 260, |x, y| {
            if (x / 8 + y / 8) % 2 == 0 {
                Rgb([0, 0, 0])
            } else {
                Rgb([255, 255, 255])
            }
        });
        let elements = detect_features(&grid(img), &FeatureParams::default());
        let mut sorted = elements.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted, elements);
    }

    #[test]
    fn test_display_names() {
        assert_eq!(StructuralElement::WindowsDoors.to_string(), "windows/doors");
        assert_eq!(StructuralElement::Walls.as_str(), "walls");
    }
}
