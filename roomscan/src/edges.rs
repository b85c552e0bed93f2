//! Edge primitives: Canny edge maps, Laplacian variance, and a per-call edge cache.
//!
//! Canny runs on the unsmoothed luminance grid with a 3x3 Sobel and the L1
//! gradient magnitude `|gx| + |gy|`, so the calibrated threshold pairs keep
//! their meaning on fine texture.

use image::{GrayImage, ImageBuffer, Luma};
use imageproc::filter::filter3x3;
use imageproc::gradients::{horizontal_sobel, vertical_sobel};
use log::trace;
use ndarray::{s, Array2};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const K_LAPLACIAN: [f32; 9] = [0.0, 1.0, 0.0, 1.0, -4.0, 1.0, 0.0, 1.0, 0.0];

type GrayF32 = ImageBuffer<Luma<f32>, Vec<f32>>;

// tan(22.5°) in Q15, for sector tests without floating point
const CANNY_SHIFT: u32 = 15;
const TG22: i64 = 13573;

/// Lower/upper hysteresis bounds on gradient magnitude
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeThresholds {
    pub low: u16,
    pub high: u16,
}

impl EdgeThresholds {
    pub const fn new(low: u16, high: u16) -> Self {
        Self { low, high }
    }
}

impl std::fmt::Display for EdgeThresholds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.low, self.high)
    }
}

/// Binary edge grid indexed `[[row, col]]`
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeMap {
    grid: Array2<bool>,
    thresholds: EdgeThresholds,
}

impl EdgeMap {
    /// Run Canny over a luminance grid
    pub fn detect(gray: &GrayImage, thresholds: EdgeThresholds) -> Self {
        Self {
            grid: canny_l1(gray, thresholds),
            thresholds,
        }
    }

    /// Any non-zero pixel counts as an edge
    pub fn from_image(edges: &GrayImage, thresholds: EdgeThresholds) -> Self {
        let (width, height) = edges.dimensions();
        let grid = Array2::from_shape_fn((height as usize, width as usize), |(row, col)| {
            edges.get_pixel(col as u32, row as u32)[0] > 0
        });
        Self { grid, thresholds }
    }

    pub fn grid(&self) -> &Array2<bool> {
        &self.grid
    }

    pub fn thresholds(&self) -> EdgeThresholds {
        self.thresholds
    }

    pub fn width(&self) -> usize {
        self.grid.ncols()
    }

    pub fn height(&self) -> usize {
        self.grid.nrows()
    }

    pub fn edge_count(&self) -> usize {
        self.grid.iter().filter(|&&e| e).count()
    }

    /// Fraction of pixels classified as edges
    pub fn density(&self) -> f64 {
        let total = self.grid.len();
        if total == 0 {
            return 0.0;
        }
        self.edge_count() as f64 / total as f64
    }

    /// Mean edge intensity on the 0/255 scale over the top `fraction` of rows.
    ///
    /// The band height is truncated; an empty band yields 0.
    pub fn band_mean(&self, fraction: f64) -> f64 {
        let rows = ((self.height() as f64) * fraction) as usize;
        let rows = rows.min(self.height());
        if rows == 0 || self.width() == 0 {
            return 0.0;
        }
        let band = self.grid.slice(s![..rows, ..]);
        let count = band.iter().filter(|&&e| e).count();
        (count as f64 * 255.0) / band.len() as f64
    }

    /// Render as a black/white image for debug dumps
    pub fn to_image(&self) -> GrayImage {
        GrayImage::from_fn(self.width() as u32, self.height() as u32, |x, y| {
            if self.grid[[y as usize, x as usize]] {
                Luma([255])
            } else {
                Luma([0])
            }
        })
    }
}

/// Non-maximum suppression and hysteresis over 3x3 Sobel gradients.
///
/// A pixel survives suppression when its magnitude exceeds `low` and beats
/// both neighbours across the gradient sector (ties go to the earlier
/// pixel). Survivors above `high` seed 8-connected growth through the rest.
/// Magnitude outside the frame counts as zero.
fn canny_l1(gray: &GrayImage, thresholds: EdgeThresholds) -> Array2<bool> {
    let (width, height) = gray.dimensions();
    let (w, h) = (width as usize, height as usize);
    if w == 0 || h == 0 {
        return Array2::from_elem((h, w), false);
    }

    let gx = horizontal_sobel(gray);
    let gy = vertical_sobel(gray);
    let dx = Array2::from_shape_fn((h, w), |(r, c)| gx.get_pixel(c as u32, r as u32)[0] as i32);
    let dy = Array2::from_shape_fn((h, w), |(r, c)| gy.get_pixel(c as u32, r as u32)[0] as i32);
    let mag = Array2::from_shape_fn((h, w), |(r, c)| dx[[r, c]].abs() + dy[[r, c]].abs());

    let low = thresholds.low.min(thresholds.high) as i32;
    let high = thresholds.low.max(thresholds.high) as i32;

    let at = |r: isize, c: isize| -> i32 {
        if r < 0 || c < 0 || r >= h as isize || c >= w as isize {
            0
        } else {
            mag[[r as usize, c as usize]]
        }
    };

    let mut candidate = Array2::from_elem((h, w), false);
    let mut strong = Vec::new();
    for r in 0..h {
        for c in 0..w {
            let m = mag[[r, c]];
            if m <= low {
                continue;
            }
            let (xs, ys) = (dx[[r, c]], dy[[r, c]]);
            let ax = xs.abs() as i64;
            let ay = (ys.abs() as i64) << CANNY_SHIFT;
            let tg22x = ax * TG22;
            let (ri, ci) = (r as isize, c as isize);

            let is_max = if ay < tg22x {
                m > at(ri, ci - 1) && m >= at(ri, ci + 1)
            } else if ay > tg22x + (ax << (CANNY_SHIFT + 1)) {
                m > at(ri - 1, ci) && m >= at(ri + 1, ci)
            } else {
                let s = if (xs ^ ys) < 0 { -1 } else { 1 };
                m > at(ri - 1, ci - s) && m > at(ri + 1, ci + s)
            };

            if is_max {
                candidate[[r, c]] = true;
                if m > high {
                    strong.push((r, c));
                }
            }
        }
    }

    let mut edges = Array2::from_elem((h, w), false);
    for &(r, c) in &strong {
        edges[[r, c]] = true;
    }
    let mut stack = strong;
    while let Some((r, c)) = stack.pop() {
        for nr in r.saturating_sub(1)..=(r + 1).min(h - 1) {
            for nc in c.saturating_sub(1)..=(c + 1).min(w - 1) {
                if candidate[[nr, nc]] && !edges[[nr, nc]] {
                    edges[[nr, nc]] = true;
                    stack.push((nr, nc));
                }
            }
        }
    }
    edges
}

/// Mirror index without repeating the edge pixel (`-1 -> 1`, `n -> n - 2`)
fn reflect_101(i: i64, n: i64) -> u32 {
    if n == 1 {
        return 0;
    }
    let i = if i < 0 { -i } else { i };
    let i = if i >= n { 2 * (n - 1) - i } else { i };
    i as u32
}

/// Variance of the 3x3 Laplacian response over the whole image.
///
/// Borders are mirrored without repeating the edge pixel, so the outermost
/// ring sees the same neighbourhood a reflected convolution would give.
pub fn laplacian_variance(gray: &GrayImage) -> f64 {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 {
        return 0.0;
    }
    // filter3x3 clamps, so pad by one reflected pixel and crop afterwards
    let (w, h) = (width as i64, height as i64);
    let padded: GrayF32 = ImageBuffer::from_fn(width + 2, height + 2, |x, y| {
        let sx = reflect_101(x as i64 - 1, w);
        let sy = reflect_101(y as i64 - 1, h);
        Luma([gray.get_pixel(sx, sy)[0] as f32])
    });
    let filtered: GrayF32 = filter3x3(&padded, &K_LAPLACIAN);
    let response: Vec<f32> = (1..=height)
        .flat_map(|y| (1..=width).map(move |x| (x, y)))
        .map(|(x, y)| filtered.get_pixel(x, y)[0])
        .collect();

    let n = response.len() as f64;
    let mean = response.iter().map(|&v| v as f64).sum::<f64>() / n;
    response
        .iter()
        .map(|&v| {
            let d = v as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / n
}

/// Edge maps for one luminance grid, computed at most once per threshold pair
pub struct EdgeCache<'a> {
    gray: &'a GrayImage,
    maps: HashMap<EdgeThresholds, EdgeMap>,
}

impl<'a> EdgeCache<'a> {
    pub fn new(gray: &'a GrayImage) -> Self {
        Self {
            gray,
            maps: HashMap::new(),
        }
    }

    pub fn gray(&self) -> &GrayImage {
        self.gray
    }

    pub fn edges(&mut self, thresholds: EdgeThresholds) -> &EdgeMap {
        let gray = self.gray;
        self.maps.entry(thresholds).or_insert_with(|| {
            trace!("Computing Canny edges at {thresholds}");
            EdgeMap::detect(gray, thresholds)
        })
    }

    /// Number of distinct edge maps computed so far
    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    /// All computed maps, ordered by threshold pair
    pub fn maps(&self) -> Vec<&EdgeMap> {
        let mut maps: Vec<&EdgeMap> = self.maps.values().collect();
        maps.sort_by_key(|m| (m.thresholds.low, m.thresholds.high));
        maps
    }
}
