//! Image decoding into an immutable RGB pixel grid.

use image::{DynamicImage, GrayImage, Luma, RgbImage};
use log::debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{AnalysisError, Result};

// BT.601 weights in 14-bit fixed point; they sum to 1 << 14.
const LUMA_R: u32 = 4899;
const LUMA_G: u32 = 9617;
const LUMA_B: u32 = 1868;
const LUMA_SHIFT: u32 = 14;

/// Decoded RGB image, height x width x 3.
///
/// The buffer is never mutated after decoding. Clones share the same
/// allocation, so a grid can be handed to several analyses at once.
#[derive(Clone, Debug)]
pub struct PixelGrid {
    rgb: Arc<RgbImage>,
}

impl PixelGrid {
    /// Wrap an already decoded image, converting it to 8-bit RGB
    pub fn from_dynamic(img: DynamicImage, source: &Path) -> Result<Self> {
        let rgb = img.into_rgb8();
        let (width, height) = rgb.dimensions();
        if width == 0 || height == 0 {
            return Err(AnalysisError::Empty {
                path: source.to_path_buf(),
                width,
                height,
            });
        }
        Ok(Self { rgb: Arc::new(rgb) })
    }

    /// Decode an in-memory encoded image (JPEG, PNG, ...)
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let source = PathBuf::from("<memory>");
        let img = image::load_from_memory(bytes).map_err(|e| AnalysisError::Decode {
            path: source.clone(),
            source: e,
        })?;
        Self::from_dynamic(img, &source)
    }

    pub fn width(&self) -> u32 {
        self.rgb.width()
    }

    pub fn height(&self) -> u32 {
        self.rgb.height()
    }

    pub fn pixel_count(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    /// Read-only view of the RGB buffer
    pub fn rgb(&self) -> &RgbImage {
        &self.rgb
    }

    /// Single-channel luminance used by every edge and threshold computation
    pub fn luminance(&self) -> GrayImage {
        let (width, height) = self.rgb.dimensions();
        let mut gray = GrayImage::new(width, height);
        for (x, y, pixel) in self.rgb.enumerate_pixels() {
            let [r, g, b] = pixel.0;
            let luma = (LUMA_R * r as u32
                + LUMA_G * g as u32
                + LUMA_B * b as u32
                + (1 << (LUMA_SHIFT - 1)))
                >> LUMA_SHIFT;
            gray.put_pixel(x, y, Luma([luma.min(255) as u8]));
        }
        gray
    }
}

/// Decode an image file into a [`PixelGrid`]
pub fn load(path: impl AsRef<Path>) -> Result<PixelGrid> {
    let path = path.as_ref();
    let img = image::open(path).map_err(|e| AnalysisError::Decode {
        path: path.to_path_buf(),
        source: e,
    })?;
    debug!(
        "Decoded {} ({}x{}, {:?})",
        path.display(),
        img.width(),
        img.height(),
        img.color()
    );
    PixelGrid::from_dynamic(img, path)
}

/// Mean of a luminance grid
pub fn mean_brightness(gray: &GrayImage) -> f64 {
    let count = gray.width() as u64 * gray.height() as u64;
    if count == 0 {
        return 0.0;
    }
    let sum: u64 = gray.as_raw().iter().map(|&v| v as u64).sum();
    sum as f64 / count as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use tempfile::tempdir;

    #[test]
    fn test_luminance_preserves_gray_levels() {
        let img = RgbImage::from_pixel(4, 3, Rgb([171, 171, 171]));
        let grid = PixelGrid::from_dynamic(DynamicImage::ImageRgb8(img), Path::new("t")).unwrap();
        let gray = grid.luminance();
        assert!(gray.as_raw().iter().all(|&v| v == 171));
        assert_eq!(mean_brightness(&gray), 171.0);
    }

    #[test]
    fn test_luminance_weights_green_highest() {
        let red = RgbImage::from_pixel(1, 1, Rgb([255, 0, 0]));
        let green = RgbImage::from_pixel(1, 1, Rgb([0, 255, 0]));
        let r = PixelGrid::from_dynamic(DynamicImage::ImageRgb8(red), Path::new("r")).unwrap();
        let g = PixelGrid::from_dynamic(DynamicImage::ImageRgb8(green), Path::new("g")).unwrap();
        assert_eq!(r.luminance().get_pixel(0, 0)[0], 76);
        assert_eq!(g.luminance().get_pixel(0, 0)[0], 150);
    }

    #[test]
    fn test_load_missing_file_is_decode_error() {
        let dir = tempdir().unwrap();
        let err = load(dir.path().join("missing.jpg")).unwrap_err();
        assert!(err.is_decode());
    }

    #[test]
    fn test_load_garbage_file_is_decode_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fake.png");
        std::fs::write(&path, b"not really a png").unwrap();
        assert!(matches!(load(&path), Err(AnalysisError::Decode { .. })));
    }

    #[test]
    fn test_load_roundtrip_dimensions() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("small.png");
        RgbImage::from_pixel(30, 20, Rgb([10, 20, 30]))
            .save(&path)
            .unwrap();
        let grid = load(&path).unwrap();
        assert_eq!((grid.width(), grid.height()), (30, 20));
        assert_eq!(grid.pixel_count(), 600);
    }

    #[test]
    fn test_from_bytes_rejects_garbage() {
        assert!(PixelGrid::from_bytes(&[0u8, 1, 2, 3]).is_err());
    }
}
