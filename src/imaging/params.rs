//! Encoding parameter types.
//!
//! These structs describe *what* to write, not *how*. Geometric and visual
//! operations have their own parameter types in [`crate::pipeline`]; this
//! module covers the last step of every job: which container format, at what
//! quality, and the format-conversion/compression settings the batch
//! coordinator groups files by.
//!
//! ## Types
//!
//! - [`Quality`] — Lossy encoding quality (1–100, default 85). Clamped on construction.
//! - [`ExportFormat`] — Output container (PNG, JPEG, WebP, GIF, BMP, TIFF, ICO).
//! - [`Encoding`] — A resolved format + quality pair handed to the backend's `save`.
//! - [`ConvertParams`] — Target format, quality, optional resize for convert/compress jobs.

use crate::pipeline::ResizeOp;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub struct Quality(u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(85)
    }
}

impl From<u32> for Quality {
    fn from(value: u32) -> Self {
        Self::new(value)
    }
}

impl From<Quality> for u32 {
    fn from(q: Quality) -> Self {
        q.0
    }
}

/// Output container format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Png,
    Jpeg,
    Webp,
    Gif,
    Bmp,
    Tiff,
    Ico,
}

impl ExportFormat {
    /// Map a file extension (any case) to a format.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::Webp),
            "gif" => Some(Self::Gif),
            "bmp" => Some(Self::Bmp),
            "tif" | "tiff" => Some(Self::Tiff),
            "ico" => Some(Self::Ico),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Canonical file extension for output names.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Webp => "webp",
            Self::Gif => "gif",
            Self::Bmp => "bmp",
            Self::Tiff => "tiff",
            Self::Ico => "ico",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Png => "PNG",
            Self::Jpeg => "JPEG",
            Self::Webp => "WEBP",
            Self::Gif => "GIF",
            Self::Bmp => "BMP",
            Self::Tiff => "TIFF",
            Self::Ico => "ICO",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_extension(s).ok_or_else(|| {
            format!("unknown format '{s}' (expected png, jpeg, webp, gif, bmp, tiff, ico)")
        })
    }
}

/// Format and quality for writing one output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Encoding {
    pub format: ExportFormat,
    pub quality: Quality,
}

/// Settings for a format conversion or compression job.
///
/// `format: None` keeps each file's own format (compression).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvertParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<ExportFormat>,
    #[serde(default)]
    pub quality: Quality,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resize: Option<ResizeOp>,
}

impl ConvertParams {
    /// Resolve the encoding for a source file, or `None` when the format is
    /// left open and the source extension is not a known format.
    pub fn encoding_for(&self, source: &Path) -> Option<Encoding> {
        let format = self.format.or_else(|| ExportFormat::from_path(source))?;
        Some(Encoding {
            format,
            quality: self.quality,
        })
    }
}
