//! High-level image operations.
//!
//! These functions combine the operation model with backend execution: they
//! walk an ordered operation list, turn each step into the matching typed
//! backend call, and write the result. [`execute_sub_batch`] is the atomic
//! unit the batch coordinator dispatches: many files, one shared parameter
//! set, results aligned positionally with the inputs.

use super::backend::{BackendError, ImageBackend, WatermarkInfo};
use super::calculations::{calculate_collage_layout, calculate_compression_ratio};
use super::params::Encoding;
use crate::pipeline::Operation;
use crate::types::Dimensions;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// What one successfully processed file produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileResult {
    pub output_path: PathBuf,
    pub original_size: u64,
    pub processed_size: u64,
    /// Percent of the original size saved; negative if the output grew.
    pub compression_ratio: f64,
    pub width: u32,
    pub height: u32,
    /// Placement of the last watermark applied, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watermark: Option<WatermarkInfo>,
}

/// One file's share of a sub-batch.
#[derive(Debug, Clone, PartialEq)]
pub struct FileJob {
    pub source: PathBuf,
    pub original_size: u64,
    pub output: PathBuf,
}

/// Apply `operations` in order to a decoded image.
///
/// Returns the transformed image and the placement of the last watermark.
pub fn apply_operations<B: ImageBackend>(
    backend: &B,
    mut image: B::Image,
    operations: &[Operation],
) -> Result<(B::Image, Option<WatermarkInfo>)> {
    let mut watermark = None;
    for op in operations {
        let dims = backend.dimensions(&image);
        image = match op {
            Operation::Crop(rect) => backend.crop(image, rect.to_pixel_region(dims))?,
            Operation::Rotate { angle } => backend.rotate(image, *angle)?,
            Operation::Flip {
                horizontal,
                vertical,
            } => backend.flip(image, *horizontal, *vertical)?,
            Operation::Resize(params) => {
                backend.resize(image, params.target(dims), params.algorithm)?
            }
            Operation::Watermark(params) => {
                let (marked, info) = backend.watermark(image, params)?;
                watermark = Some(info);
                marked
            }
            Operation::Mosaic(params) => backend.mosaic(image, params)?,
            Operation::Collage(params) => {
                let layout = calculate_collage_layout(
                    dims,
                    params.rows,
                    params.columns,
                    params.gap,
                    params.output_width,
                )
                .ok_or_else(|| {
                    BackendError::ProcessingFailed(format!(
                        "Collage grid {}x{} does not fit a {}x{} image",
                        params.rows, params.columns, dims.width, dims.height
                    ))
                })?;
                backend.collage(image, params, &layout)?
            }
        };
    }
    Ok((image, watermark))
}

/// Open `job.source`, run the operations, and write `job.output`.
///
/// The backend creates missing parent directories of the output.
pub fn process_file<B: ImageBackend>(
    backend: &B,
    job: &FileJob,
    operations: &[Operation],
    encoding: &Encoding,
) -> Result<FileResult> {
    let image = backend.open(&job.source)?;
    let (image, watermark) = apply_operations(backend, image, operations)?;
    let processed_size = backend.save(&image, &job.output, encoding)?;
    let Dimensions { width, height } = backend.dimensions(&image);
    Ok(FileResult {
        output_path: job.output.clone(),
        original_size: job.original_size,
        processed_size,
        compression_ratio: calculate_compression_ratio(job.original_size, processed_size),
        width,
        height,
        watermark,
    })
}

/// Run one shared operation list + encoding over many files.
///
/// Files are processed in parallel; the returned vector is aligned with
/// `jobs` (index `i` is the outcome of `jobs[i]`). A failing file never
/// affects its siblings.
pub fn execute_sub_batch<B: ImageBackend>(
    backend: &B,
    jobs: &[FileJob],
    operations: &[Operation],
    encoding: &Encoding,
) -> Vec<Result<FileResult>> {
    jobs.par_iter()
        .map(|job| {
            let result = process_file(backend, job, operations, encoding);
            if let Err(e) = &result {
                tracing::warn!(source = %job.source.display(), error = %e, "file failed");
            }
            result
        })
        .collect()
}
