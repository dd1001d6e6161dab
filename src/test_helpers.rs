//! Shared test utilities.
//!
//! Small synthetic images written to disk, for tests that exercise the real
//! `image`-crate backend. Pixel values form a gradient so crops and flips
//! produce distinguishable output.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::test_helpers::*;
//!
//! let tmp = tempfile::TempDir::new().unwrap();
//! let path = tmp.path().join("photo.png");
//! create_test_png(&path, 64, 48);
//! ```

use image::{ImageEncoder, Rgb, RgbImage, Rgba, RgbaImage};
use std::path::Path;

// =========================================================================
// Fixture images
// =========================================================================

/// Write an RGB gradient JPEG.
pub fn create_test_jpeg(path: &Path, width: u32, height: u32) {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let file = std::fs::File::create(path).unwrap();
    let writer = std::io::BufWriter::new(file);
    image::codecs::jpeg::JpegEncoder::new(writer)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
}

/// Write an RGBA gradient PNG with partial transparency.
pub fn create_test_png(path: &Path, width: u32, height: u32) {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, 64, 200])
    });
    img.save(path).unwrap();
}
