//! Synthetic room images shared by the integration tests.
#![allow(dead_code)]

use image::{Rgb, RgbImage};
use std::path::{Path, PathBuf};

/// Vertical panels of alternating tone over a darker floor band
pub fn room_like(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let tone = if (x / 40) % 2 == 0 { 60 } else { 200 };
        let v = if y > height * 2 / 3 { tone / 2 } else { tone };
        Rgb([v, v, v])
    })
}

pub fn uniform(width: u32, height: u32, level: u8) -> RgbImage {
    RgbImage::from_pixel(width, height, Rgb([level, level, level]))
}

pub fn save(dir: &Path, name: &str, img: &RgbImage) -> PathBuf {
    let path = dir.join(name);
    img.save(&path).unwrap();
    path
}
