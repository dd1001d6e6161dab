//! File selection.
//!
//! Turns user-supplied paths (files or directories) into identified images.
//! Directories are walked recursively; only files with an allow-listed
//! extension are considered. Each candidate is then introspected through the
//! backend's `identify`. A file that fails any step is reported in
//! [`Selection::rejected`] and never becomes a task; the rest of the
//! selection proceeds.
//!
//! Hidden files and directories (leading `.`) are skipped during the walk.
//! Paths given explicitly are always checked, hidden or not.

use crate::imaging::ImageBackend;
use crate::types::ImageInfo;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Extensions accepted for selection (compared case-insensitively).
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "webp", "gif", "bmp", "tiff", "tif", "ico",
];

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SelectionError {
    #[error("Unsupported file type: {0}")]
    UnsupportedExtension(PathBuf),
    #[error("Failed to load metadata for {path}: {message}")]
    MetadataLoadFailure { path: PathBuf, message: String },
    #[error("Selected more than once: {0}")]
    Duplicate(PathBuf),
}

impl SelectionError {
    pub fn path(&self) -> &Path {
        match self {
            Self::UnsupportedExtension(p) | Self::Duplicate(p) => p,
            Self::MetadataLoadFailure { path, .. } => path,
        }
    }
}

pub fn is_supported(path: &Path) -> bool {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    SUPPORTED_EXTENSIONS.contains(&ext.as_str())
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
}

/// Expand directories into the supported image files beneath them.
///
/// Plain file paths pass through unchanged (even unsupported ones, so that
/// [`select_files`] can report them). Files found inside a directory are
/// sorted; unreadable directory entries are skipped with a warning.
pub fn expand_inputs(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut expanded = Vec::new();
    for path in paths {
        if !path.is_dir() {
            expanded.push(path.clone());
            continue;
        }
        let mut found: Vec<PathBuf> = WalkDir::new(path)
            .into_iter()
            .filter_entry(|e| !is_hidden(e))
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable entry");
                    None
                }
            })
            .filter(|e| e.file_type().is_file() && is_supported(e.path()))
            .map(|e| e.into_path())
            .collect();
        found.sort();
        expanded.extend(found);
    }
    expanded
}

/// Outcome of a selection: identified images and per-path rejections.
#[derive(Debug, Default)]
pub struct Selection {
    pub accepted: Vec<ImageInfo>,
    pub rejected: Vec<SelectionError>,
}

/// Validate and identify `paths`, in order.
pub fn select_files<B: ImageBackend>(backend: &B, paths: &[PathBuf]) -> Selection {
    let mut selection = Selection::default();
    let mut seen = HashSet::new();
    for path in paths {
        if !is_supported(path) {
            tracing::warn!(path = %path.display(), "unsupported extension");
            selection
                .rejected
                .push(SelectionError::UnsupportedExtension(path.clone()));
            continue;
        }
        if !seen.insert(path.clone()) {
            selection.rejected.push(SelectionError::Duplicate(path.clone()));
            continue;
        }
        match backend.identify(path) {
            Ok(info) => selection.accepted.push(info),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "metadata load failed");
                selection.rejected.push(SelectionError::MetadataLoadFailure {
                    path: path.clone(),
                    message: e.to_string(),
                });
            }
        }
    }
    selection
}
