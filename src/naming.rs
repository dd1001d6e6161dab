//! Output filename generation.
//!
//! Every job writes `{stem}{suffix}.{ext}`: the source file stem, a per-job
//! suffix (`_converted` for format jobs, `_edited` for pipelines by default),
//! and the extension of the output format. Outputs land next to their source
//! unless an output directory is configured.
//!
//! - `/photos/dawn.png` + `_converted` + webp → `/photos/dawn_converted.webp`
//! - same, with dir `/out` → `/out/dawn_converted.webp`
//!
//! Names depend only on the source path and settings, so re-running a job
//! overwrites its own previous outputs instead of piling up copies.

use std::path::{Path, PathBuf};

/// Where and how outputs are named.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputNaming {
    /// Target directory; `None` writes beside each source.
    pub dir: Option<PathBuf>,
    pub suffix: String,
}

impl OutputNaming {
    pub fn beside_source(suffix: impl Into<String>) -> Self {
        Self {
            dir: None,
            suffix: suffix.into(),
        }
    }

    pub fn in_dir(dir: impl Into<PathBuf>, suffix: impl Into<String>) -> Self {
        Self {
            dir: Some(dir.into()),
            suffix: suffix.into(),
        }
    }

    /// Output path for `source` written with extension `ext`.
    pub fn output_path(&self, source: &Path, ext: &str) -> PathBuf {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        let name = format!("{stem}{}.{ext}", self.suffix);
        match &self.dir {
            Some(dir) => dir.join(name),
            None => source
                .parent()
                .map(|p| p.join(&name))
                .unwrap_or_else(|| PathBuf::from(&name)),
        }
    }
}
