//! Image-space geometry and the crop constraint engine.
//!
//! Every crop rectangle the overlay ever emits goes through [`constrain`].
//! It is total: any finite (or even non-finite) candidate comes back as a
//! rectangle that lies inside the image and is at least [`MIN_CROP_SIZE`]
//! on each side.
//!
//! The clamp order matters. Position is clamped first, against
//! `[0, image - MIN_CROP_SIZE]`, and only then is the size clamped against
//! the space remaining to the right of (below) the clamped position. Doing it
//! the other way round lets a handle drag push the far edge out of bounds.
//!
//! Images smaller than [`MIN_CROP_SIZE`] on an axis cannot satisfy both the
//! minimum and the bounds; on that axis the crop spans the whole image.

use crate::types::Dimensions;
use serde::{Deserialize, Serialize};

/// Smallest crop edge, in image pixels.
pub const MIN_CROP_SIZE: f64 = 10.0;

/// A point in image space (or screen space, depending on context).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle in image-pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rectangle {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Integer pixel region handed to the imaging backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rectangle {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The rectangle covering the whole image.
    pub fn full(dims: Dimensions) -> Self {
        Self::new(0.0, 0.0, dims.width as f64, dims.height as f64)
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    /// Whether the rectangle satisfies the crop invariants for an image of
    /// the given size: non-negative origin, inside the bounds, and at least
    /// [`MIN_CROP_SIZE`] on each side (or the full axis for tiny images).
    pub fn is_valid_within(&self, image_width: u32, image_height: u32) -> bool {
        axis_valid(self.x, self.width, image_width as f64)
            && axis_valid(self.y, self.height, image_height as f64)
    }

    /// Round to whole pixels, keeping the region inside the image and at
    /// least one pixel in each direction.
    pub fn to_pixel_region(&self, dims: Dimensions) -> PixelRegion {
        let (x, width) = round_axis(self.x, self.width, dims.width);
        let (y, height) = round_axis(self.y, self.height, dims.height);
        PixelRegion {
            x,
            y,
            width,
            height,
        }
    }
}

/// Tolerance for float comparisons on pixel coordinates.
const EPSILON: f64 = 1e-9;

fn axis_valid(origin: f64, extent: f64, limit: f64) -> bool {
    let min_extent = MIN_CROP_SIZE.min(limit);
    origin.is_finite()
        && extent.is_finite()
        && origin >= 0.0
        && extent >= min_extent - EPSILON
        && origin + extent <= limit + EPSILON
}

fn round_axis(origin: f64, extent: f64, limit: u32) -> (u32, u32) {
    if limit == 0 {
        return (0, 0);
    }
    let start = clamp_total(origin.round(), 0.0, (limit - 1) as f64) as u32;
    let room = limit - start;
    let len = clamp_total(extent.round(), 1.0, room as f64) as u32;
    (start, len)
}

/// `f64::clamp` that maps NaN to the lower bound instead of propagating it.
fn clamp_total(value: f64, lo: f64, hi: f64) -> f64 {
    if value.is_nan() {
        lo
    } else {
        value.clamp(lo, hi)
    }
}

/// Clamp a candidate crop rectangle into a valid one for the given image.
///
/// 1. `x` to `[0, image_width - MIN_CROP_SIZE]`, `y` likewise.
/// 2. `width` to `[MIN_CROP_SIZE, image_width - x]`, `height` likewise.
///
/// Idempotent: `constrain(constrain(r)) == constrain(r)`.
pub fn constrain(candidate: Rectangle, image_width: u32, image_height: u32) -> Rectangle {
    let (x, width) = constrain_axis(candidate.x, candidate.width, image_width as f64);
    let (y, height) = constrain_axis(candidate.y, candidate.height, image_height as f64);
    Rectangle {
        x,
        y,
        width,
        height,
    }
}

fn constrain_axis(origin: f64, extent: f64, limit: f64) -> (f64, f64) {
    let max_origin = (limit - MIN_CROP_SIZE).max(0.0);
    let origin = clamp_total(origin, 0.0, max_origin);
    let room = limit - origin;
    let extent = clamp_total(extent, MIN_CROP_SIZE.min(room), room);
    (origin, extent)
}
