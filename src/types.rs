//! Shared types used across the crop overlay, pipeline, and batch layers.
//!
//! [`ImageInfo`] is what the metadata query returns for a selected file and is
//! what every later stage keys off: the editing session sizes its crop bounds
//! from it, and the batch coordinator validates operations against it.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Natural pixel dimensions of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Dimensions with width and height swapped (quarter-turn rotation).
    pub fn transposed(self) -> Self {
        Self {
            width: self.height,
            height: self.width,
        }
    }
}

/// Channel layout of a decoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorSpace {
    Gray,
    GrayAlpha,
    Rgb,
    Rgba,
}

impl ColorSpace {
    pub fn has_alpha(self) -> bool {
        matches!(self, ColorSpace::GrayAlpha | ColorSpace::Rgba)
    }

    pub fn label(self) -> &'static str {
        match self {
            ColorSpace::Gray => "Gray",
            ColorSpace::GrayAlpha => "GrayA",
            ColorSpace::Rgb => "RGB",
            ColorSpace::Rgba => "RGBA",
        }
    }
}

/// Metadata for one selected image file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub path: PathBuf,
    /// File name component of `path`, for display.
    pub filename: String,
    pub width: u32,
    pub height: u32,
    /// Uppercased container format, e.g. `"PNG"` or `"JPEG"`.
    pub format: String,
    /// Size on disk in bytes.
    pub file_size: u64,
    pub color_space: ColorSpace,
    pub has_alpha: bool,
}

impl ImageInfo {
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transposed_swaps_axes() {
        let d = Dimensions::new(1920, 1080).transposed();
        assert_eq!(d, Dimensions::new(1080, 1920));
    }

    #[test]
    fn alpha_follows_color_space() {
        assert!(ColorSpace::Rgba.has_alpha());
        assert!(ColorSpace::GrayAlpha.has_alpha());
        assert!(!ColorSpace::Rgb.has_alpha());
        assert!(!ColorSpace::Gray.has_alpha());
    }

    #[test]
    fn color_space_serializes_lowercase() {
        let json = serde_json::to_string(&ColorSpace::GrayAlpha).unwrap();
        assert_eq!(json, "\"grayalpha\"");
    }
}
