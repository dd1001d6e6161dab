//! CLI output formatting.
//!
//! Every entity is shown as a header line (positional index + file name)
//! followed by indented context lines:
//!
//! ## Info
//!
//! ```text
//! 001 dawn.png
//!     Source: /photos/dawn.png
//!     1920x1080 PNG RGBA, 2.4 MB
//! ```
//!
//! ## Batch
//!
//! ```text
//! [1/2]  50%
//! [2/2] 100%
//! 001 dawn.png → /out/dawn_converted.webp
//!     2.4 MB → 812.0 KB (66.2% smaller)
//! 002 dusk.png FAILED
//!     Error: decode error
//!
//! Processed 2 files: 1 succeeded, 1 failed
//! ```
//!
//! ## Pipeline
//!
//! ```text
//! Source 1920x1080
//! 001 rotate 90° → 1080x1920
//! 002 crop 800x600 at (10, 20) → 800x600
//! ```
//!
//! Each section has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Progress lines
//! are the exception: they go to stderr with the logs, so stdout carries only
//! command results (and stays valid JSON under `--json`). Format functions
//! are pure: no I/O, no side effects.

use crate::batch::BatchResult;
use crate::pipeline::Operation;
use crate::progress::Progress;
use crate::selection::SelectionError;
use crate::types::{Dimensions, ImageInfo};
use std::io::{self, Write};
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Human-readable byte count (1024-based).
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}

fn format_dims(dims: Dimensions) -> String {
    format!("{}x{}", dims.width, dims.height)
}

// ============================================================================
// Info
// ============================================================================

pub fn format_file_info(index: usize, info: &ImageInfo) -> Vec<String> {
    vec![
        format!("{} {}", format_index(index), info.filename),
        format!("    Source: {}", info.path.display()),
        format!(
            "    {} {} {}, {}",
            format_dims(info.dimensions()),
            info.format,
            info.color_space.label(),
            format_size(info.file_size)
        ),
    ]
}

pub fn format_rejections(rejected: &[SelectionError]) -> Vec<String> {
    rejected.iter().map(|e| format!("Skipped: {e}")).collect()
}

pub fn print_file_info(infos: &[ImageInfo], rejected: &[SelectionError]) {
    for (i, info) in infos.iter().enumerate() {
        for line in format_file_info(i + 1, info) {
            println!("{}", line);
        }
    }
    for line in format_rejections(rejected) {
        println!("{}", line);
    }
}

// ============================================================================
// Batch
// ============================================================================

pub fn format_progress(progress: &Progress) -> String {
    format!(
        "[{}/{}] {:>3.0}%",
        progress.processed, progress.total, progress.percentage
    )
}

fn write_progress(out: &mut impl Write, progress: &Progress) -> io::Result<()> {
    writeln!(out, "{}", format_progress(progress))
}

/// Progress goes to stderr, never to stdout.
pub fn print_progress(progress: &Progress) {
    // A closed stderr is not worth aborting a batch over.
    let _ = write_progress(&mut io::stderr().lock(), progress);
}

pub fn format_batch_result(result: &BatchResult) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, outcome) in result.outcomes.iter().enumerate() {
        let name = file_name(&outcome.path);
        match &outcome.result {
            Ok(file) => {
                lines.push(format!(
                    "{} {} \u{2192} {}",
                    format_index(i + 1),
                    name,
                    file.output_path.display()
                ));
                let change = if file.compression_ratio >= 0.0 {
                    format!("{:.1}% smaller", file.compression_ratio)
                } else {
                    format!("{:.1}% larger", -file.compression_ratio)
                };
                lines.push(format!(
                    "    {} \u{2192} {} ({})",
                    format_size(file.original_size),
                    format_size(file.processed_size),
                    change
                ));
                if let Some(mark) = &file.watermark {
                    lines.push(format!(
                        "    Watermark: {}x{} at ({}, {})",
                        mark.width, mark.height, mark.x, mark.y
                    ));
                }
            }
            Err(e) => {
                lines.push(format!("{} {} FAILED", format_index(i + 1), name));
                lines.push(format!("    Error: {e}"));
            }
        }
    }
    if !lines.is_empty() {
        lines.push(String::new());
    }
    lines.push(format!(
        "Processed {} files: {} succeeded, {} failed",
        result.total(),
        result.success_count,
        result.failed_count
    ));
    lines
}

pub fn print_batch_result(result: &BatchResult) {
    for line in format_batch_result(result) {
        println!("{}", line);
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// List pipeline steps with the image size each one produces.
pub fn format_pipeline(source: Dimensions, operations: &[Operation]) -> Vec<String> {
    let mut lines = vec![format!("Source {}", format_dims(source))];
    let mut dims = source;
    for (i, op) in operations.iter().enumerate() {
        dims = op.output_dimensions(dims);
        lines.push(format!(
            "{} {} \u{2192} {}",
            format_index(i + 1),
            op.summary(),
            format_dims(dims)
        ));
    }
    lines
}

pub fn print_pipeline(source: Dimensions, operations: &[Operation]) {
    for line in format_pipeline(source, operations) {
        println!("{}", line);
    }
}
