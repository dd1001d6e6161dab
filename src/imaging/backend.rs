//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait is a typed capability interface: one method per
//! operation kind, plus identify/open/save. Nothing above this layer
//! dispatches on operation names; [`operations`](super::operations) matches
//! on [`Operation`](crate::pipeline::Operation) and calls the right method.
//!
//! Operations take the image by value and hand back the transformed one, so
//! a backend is free to transform in place.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Tests use the `MockBackend` below, which tracks dimensions and
//! records every call without touching pixels.

use super::calculations::CollageLayout;
use super::params::Encoding;
use crate::crop::PixelRegion;
use crate::pipeline::{CollageOp, MosaicOp, ResizeAlgorithm, WatermarkOp};
use crate::types::{Dimensions, ImageInfo};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode {path}: {message}")]
    Decode { path: String, message: String },
    #[error("Failed to encode {path}: {message}")]
    Encode { path: String, message: String },
    #[error("{0}")]
    ProcessingFailed(String),
}

/// Where a watermark landed on the output image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatermarkInfo {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
///
/// Every backend must implement every operation kind so the rest of the
/// codebase is backend-agnostic.
pub trait ImageBackend: Sync {
    /// Decoded, in-memory image.
    type Image: Send;

    /// Read format, dimensions, and color layout without a full decode where
    /// possible.
    fn identify(&self, path: &Path) -> Result<ImageInfo, BackendError>;

    fn open(&self, path: &Path) -> Result<Self::Image, BackendError>;

    fn dimensions(&self, image: &Self::Image) -> Dimensions;

    fn crop(&self, image: Self::Image, region: PixelRegion) -> Result<Self::Image, BackendError>;

    /// Clockwise rotation by 0, 90, 180, or 270 degrees.
    fn rotate(&self, image: Self::Image, angle: u32) -> Result<Self::Image, BackendError>;

    fn flip(
        &self,
        image: Self::Image,
        horizontal: bool,
        vertical: bool,
    ) -> Result<Self::Image, BackendError>;

    /// Resize to exactly `target`.
    fn resize(
        &self,
        image: Self::Image,
        target: Dimensions,
        algorithm: ResizeAlgorithm,
    ) -> Result<Self::Image, BackendError>;

    fn watermark(
        &self,
        image: Self::Image,
        params: &WatermarkOp,
    ) -> Result<(Self::Image, WatermarkInfo), BackendError>;

    fn mosaic(&self, image: Self::Image, params: &MosaicOp) -> Result<Self::Image, BackendError>;

    /// Compose a grid with `image` in the first cell and `params.image_paths`
    /// in the following cells.
    fn collage(
        &self,
        image: Self::Image,
        params: &CollageOp,
        layout: &CollageLayout,
    ) -> Result<Self::Image, BackendError>;

    /// Encode and write. Returns the number of bytes written.
    fn save(
        &self,
        image: &Self::Image,
        path: &Path,
        encoding: &Encoding,
    ) -> Result<u64, BackendError>;
}
