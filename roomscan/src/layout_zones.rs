//! Furniture layout overlay drawn on top of an analyzed photo.
//!
//! The zones are fixed fractions and offsets of the frame, not derived from
//! detected content.

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::image_loader::PixelGrid;

pub const OUTLINE_WIDTH: i64 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    Sofa,
    Tv,
    WalkingSpace,
}

impl Zone {
    pub const ALL: [Zone; 3] = [Zone::Sofa, Zone::Tv, Zone::WalkingSpace];

    pub fn label(&self) -> &'static str {
        match self {
            Zone::Sofa => "SOFA ZONE",
            Zone::Tv => "TV ZONE",
            Zone::WalkingSpace => "WALKING SPACE",
        }
    }

    pub fn color(&self) -> Rgb<u8> {
        match self {
            Zone::Sofa => Rgb([0, 0, 255]),
            Zone::Tv => Rgb([255, 0, 0]),
            Zone::WalkingSpace => Rgb([0, 128, 0]),
        }
    }

    /// Inclusive corners `(x0, y0, x1, y1)`; may lie outside the frame or be
    /// inverted on small images.
    pub fn corners(&self, width: u32, height: u32) -> (i64, i64, i64, i64) {
        let (w, h) = (width as i64, height as i64);
        match self {
            Zone::Sofa => (50, h - 220, w / 2, h - 50),
            Zone::Tv => (w / 2 + 50, 50, w - 50, 200),
            Zone::WalkingSpace => (w / 3, h / 3, w * 2 / 3, h * 2 / 3),
        }
    }
}

/// Zones that form a proper rectangle for this frame size
pub fn visible_zones(width: u32, height: u32) -> Vec<Zone> {
    Zone::ALL
        .into_iter()
        .filter(|zone| {
            let (x0, y0, x1, y1) = zone.corners(width, height);
            x1 >= x0 && y1 >= y0
        })
        .collect()
}

/// Copy of the photo with the layout zones outlined
pub fn draw_layout_zones(grid: &PixelGrid) -> RgbImage {
    let mut canvas = grid.rgb().clone();
    let (width, height) = canvas.dimensions();

    for zone in visible_zones(width, height) {
        let (x0, y0, x1, y1) = zone.corners(width, height);
        // Outline grows inward, one rectangle per pixel of thickness
        for inset in 0..OUTLINE_WIDTH {
            let w = x1 - x0 + 1 - 2 * inset;
            let h = y1 - y0 + 1 - 2 * inset;
            if w <= 0 || h <= 0 {
                break;
            }
            let rect = Rect::at((x0 + inset) as i32, (y0 + inset) as i32).of_size(w as u32, h as u32);
            draw_hollow_rect_mut(&mut canvas, rect, zone.color());
        }
    }

    canvas
}
