//! Image processing, pure Rust.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::ImageReader::into_decoder` |
//! | **Crop / rotate / flip / resize** | `image::DynamicImage` |
//! | **Text watermark** | `ab_glyph` rasterization |
//! | **Encode** | `image` codecs, JPEG with explicit quality |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension and placement math (unit testable)
//! - **Parameters**: Output format and quality types
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: Apply an operation list to a file, and run a sub-batch

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, ImageBackend, WatermarkInfo};
pub use calculations::{
    CollageLayout, WATERMARK_PADDING, calculate_collage_layout, calculate_compression_ratio,
    calculate_resize_target, calculate_watermark_position, parse_hex_color,
};
pub use operations::{FileJob, FileResult, apply_operations, execute_sub_batch, process_file};
pub use params::{ConvertParams, Encoding, ExportFormat, Quality};
pub use rust_backend::RustBackend;
