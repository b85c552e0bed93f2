//! Progressive probabilistic Hough transform over a binary edge map.
//!
//! Edge points are visited in a pseudo-random order. Each point votes into a
//! (theta, rho) accumulator; once a bin reaches the vote threshold the
//! corresponding line is walked in both directions across the edge mask,
//! tolerating up to `max_line_gap` missing pixels. Walked pixels are removed
//! from the mask, and when the segment is long enough their votes are
//! withdrawn so they cannot support another line.
//!
//! The visiting order comes from a fixed seed, so the same edge map always
//! yields the same segments.

use log::trace;
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::edges::EdgeMap;

const HOUGH_SEED: u64 = u64::MAX;
// Fixed-point precision used while stepping along a line
const SHIFT: u32 = 16;

/// Parameters of one probabilistic line detection pass
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HoughParams {
    /// Distance resolution of the accumulator in pixels
    pub rho: f64,
    /// Angular resolution of the accumulator in degrees
    pub theta_degrees: f64,
    /// Minimum accumulator votes for a line candidate
    pub threshold: u32,
    /// Segments shorter than this (along their dominant axis) are dropped
    pub min_line_length: u32,
    /// Maximum run of missing pixels allowed inside one segment
    pub max_line_gap: u32,
}

impl HoughParams {
    pub const fn new(threshold: u32, min_line_length: u32, max_line_gap: u32) -> Self {
        Self {
            rho: 1.0,
            theta_degrees: 1.0,
            threshold,
            min_line_length,
            max_line_gap,
        }
    }
}

/// A detected straight segment, endpoints in (x, y) pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LineSegment {
    pub start: (u32, u32),
    pub end: (u32, u32),
}

impl LineSegment {
    pub fn length(&self) -> f64 {
        let dx = self.end.0 as f64 - self.start.0 as f64;
        let dy = self.end.1 as f64 - self.start.1 as f64;
        dx.hypot(dy)
    }
}

struct Accumulator {
    votes: Array2<i32>,
    trig: Vec<(f64, f64)>,
    rho_offset: i64,
}

impl Accumulator {
    fn new(width: usize, height: usize, params: &HoughParams) -> Self {
        let theta = params.theta_degrees.to_radians();
        let irho = 1.0 / params.rho;
        let num_angle = ((PI / theta).round() as usize).max(1);
        let num_rho = ((((width + height) * 2 + 1) as f64) / params.rho).round() as usize;
        let trig = (0..num_angle)
            .map(|n| {
                let angle = n as f64 * theta;
                (angle.cos() * irho, angle.sin() * irho)
            })
            .collect();
        Self {
            votes: Array2::zeros((num_angle, num_rho)),
            trig,
            rho_offset: (num_rho as i64 - 1) / 2,
        }
    }

    fn rho_index(&self, n: usize, x: usize, y: usize) -> usize {
        let (cos_t, sin_t) = self.trig[n];
        let r = (x as f64 * cos_t + y as f64 * sin_t).round_ties_even() as i64;
        let idx = r + self.rho_offset;
        idx.clamp(0, self.votes.ncols() as i64 - 1) as usize
    }

    /// Add one point's votes; returns the strongest angle bin and its count
    fn vote(&mut self, x: usize, y: usize, threshold: i32) -> (usize, i32) {
        let mut max_votes = threshold - 1;
        let mut max_n = 0;
        for n in 0..self.trig.len() {
            let r = self.rho_index(n, x, y);
            let cell = &mut self.votes[[n, r]];
            *cell += 1;
            if *cell > max_votes {
                max_votes = *cell;
                max_n = n;
            }
        }
        (max_n, max_votes)
    }

    fn unvote(&mut self, x: usize, y: usize) {
        for n in 0..self.trig.len() {
            let r = self.rho_index(n, x, y);
            self.votes[[n, r]] -= 1;
        }
    }
}

/// Stepping state for walking along one candidate line
#[derive(Clone, Copy)]
struct Walk {
    x0: i64,
    y0: i64,
    dx: i64,
    dy: i64,
    x_major: bool,
}

impl Walk {
    fn new(x: usize, y: usize, cos_t: f64, sin_t: f64) -> Self {
        let a = -sin_t;
        let b = cos_t;
        let one = (1i64 << SHIFT) as f64;
        let half = 1i64 << (SHIFT - 1);
        if a.abs() > b.abs() {
            Self {
                x0: x as i64,
                y0: ((y as i64) << SHIFT) + half,
                dx: if a > 0.0 { 1 } else { -1 },
                dy: (b * one / a.abs()).round_ties_even() as i64,
                x_major: true,
            }
        } else {
            Self {
                x0: ((x as i64) << SHIFT) + half,
                y0: y as i64,
                dx: (a * one / b.abs()).round_ties_even() as i64,
                dy: if b > 0.0 { 1 } else { -1 },
                x_major: false,
            }
        }
    }

    fn reversed(self) -> Self {
        Self {
            dx: -self.dx,
            dy: -self.dy,
            ..self
        }
    }

    /// Pixel visited at `step`, or None once it leaves the image
    fn pixel(&self, step: i64, width: usize, height: usize) -> Option<(usize, usize)> {
        let px = self.x0 + step * self.dx;
        let py = self.y0 + step * self.dy;
        let (col, row) = if self.x_major {
            (px, py >> SHIFT)
        } else {
            (px >> SHIFT, py)
        };
        if col < 0 || row < 0 || col >= width as i64 || row >= height as i64 {
            None
        } else {
            Some((col as usize, row as usize))
        }
    }
}

/// Find straight segments in an edge map.
///
/// Stops early once `max_lines` segments have been found.
pub fn detect_segments(
    edges: &EdgeMap,
    params: &HoughParams,
    max_lines: Option<usize>,
) -> Vec<LineSegment> {
    let width = edges.width();
    let height = edges.height();
    let mut segments = Vec::new();
    if width == 0 || height == 0 {
        return segments;
    }

    let mut mask = edges.grid().clone();
    let mut points: Vec<(usize, usize)> = mask
        .indexed_iter()
        .filter(|(_, e)| **e)
        .map(|((row, col), _)| (col, row))
        .collect();

    let mut acc = Accumulator::new(width, height, params);
    let mut rng = StdRng::seed_from_u64(HOUGH_SEED);
    let threshold = params.threshold as i32;
    let min_len = params.min_line_length as usize;
    let max_gap = params.max_line_gap;

    let mut remaining = points.len();
    while remaining > 0 {
        let idx = rng.gen_range(0..remaining);
        let (x, y) = points[idx];
        points[idx] = points[remaining - 1];
        remaining -= 1;

        if !mask[[y, x]] {
            continue;
        }

        let (best_n, best_votes) = acc.vote(x, y, threshold);
        if best_votes < threshold {
            continue;
        }

        let (cos_t, sin_t) = acc.trig[best_n];
        let forward = Walk::new(x, y, cos_t, sin_t);
        let walks = [forward, forward.reversed()];

        let mut line_end = [(x, y); 2];
        for (walk, end) in walks.iter().zip(line_end.iter_mut()) {
            let mut gap = 0;
            let mut step = 0;
            while let Some((col, row)) = walk.pixel(step, width, height) {
                if mask[[row, col]] {
                    gap = 0;
                    *end = (col, row);
                } else {
                    gap += 1;
                    if gap > max_gap {
                        break;
                    }
                }
                step += 1;
            }
        }

        let good_line = line_end[0].0.abs_diff(line_end[1].0) >= min_len
            || line_end[0].1.abs_diff(line_end[1].1) >= min_len;

        for (walk, end) in walks.iter().zip(line_end.iter()) {
            let mut step = 0;
            while let Some((col, row)) = walk.pixel(step, width, height) {
                if mask[[row, col]] {
                    if good_line {
                        acc.unvote(col, row);
                    }
                    mask[[row, col]] = false;
                }
                if (col, row) == *end {
                    break;
                }
                step += 1;
            }
        }

        if good_line {
            let segment = LineSegment {
                start: (line_end[0].0 as u32, line_end[0].1 as u32),
                end: (line_end[1].0 as u32, line_end[1].1 as u32),
            };
            trace!("Hough segment {:?} (votes {best_votes})", segment);
            segments.push(segment);
            if max_lines.is_some_and(|max| segments.len() >= max) {
                break;
            }
        }
    }

    segments
}

/// True when at least one segment satisfies the parameters
pub fn has_line(edges: &EdgeMap, params: &HoughParams) -> bool {
    !detect_segments(edges, params, Some(1)).is_empty()
}
