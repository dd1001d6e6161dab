//! Batch execution.
//!
//! [`run_batch`] applies one [`BatchSpec`] to many identified images and
//! always returns one outcome per input, in input order. The flow is:
//!
//! 1. **Resolve**: for every file, turn the [`BatchSpec`] into a concrete operation
//!    list and [`Encoding`] and validate the list against that file's
//!    dimensions. Files that fail here are recorded as
//!    [`FileFailure::InvalidParameters`] and never reach the backend.
//! 2. **Group**: files whose resolved parameters are identical form one
//!    sub-batch. Compression keeps each file's own format, so it naturally
//!    splits by source format; a conversion to one target format is a single
//!    group.
//! 3. **Dispatch**: sub-batches run concurrently on the rayon pool, one
//!    [`execute_sub_batch`] call each. Every input index belongs to exactly
//!    one sub-batch, so results are written back without contention.
//! 4. **Report**: progress is emitted after each sub-batch completes, and
//!    per-file failures are kept with their message.
//!
//! An output path may not be another file's output or any file of the same
//! batch, inputs included; such files fail with [`FileFailure::OutputConflict`].
//! Re-running the same batch writes the same output paths, overwriting the
//! previous results.
//!
//! [`BatchJob`] wraps this in a task list with per-file status for callers
//! that add and remove files between runs.

use crate::imaging::{
    ConvertParams, Encoding, ExportFormat, FileJob, FileResult, ImageBackend, Quality,
    execute_sub_batch,
};
use crate::naming::OutputNaming;
use crate::pipeline::{Operation, ResizeOp, validate_chain};
use crate::progress::{Progress, ProgressSink};
use crate::types::ImageInfo;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

/// What a batch does to every file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BatchSpec {
    /// Re-encode to `params.format` (or the source format when unset).
    Convert(ConvertParams),
    /// Re-encode every file in its own format at `quality`.
    Compress {
        #[serde(default)]
        quality: Quality,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        resize: Option<ResizeOp>,
    },
    /// Apply an edit pipeline, optionally exporting to another format.
    Pipeline {
        operations: Vec<Operation>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        format: Option<ExportFormat>,
        #[serde(default)]
        quality: Quality,
    },
}

impl BatchSpec {
    /// Operation list and encoding for one file.
    fn resolve(&self, source: &Path) -> Result<(Vec<Operation>, Encoding), FileFailure> {
        let (operations, params) = match self {
            Self::Convert(params) => (
                params.resize.clone().map(Operation::Resize).into_iter().collect(),
                params.clone(),
            ),
            Self::Compress { quality, resize } => (
                resize.clone().map(Operation::Resize).into_iter().collect(),
                ConvertParams {
                    format: None,
                    quality: *quality,
                    resize: None,
                },
            ),
            Self::Pipeline {
                operations,
                format,
                quality,
            } => (
                operations.clone(),
                ConvertParams {
                    format: *format,
                    quality: *quality,
                    resize: None,
                },
            ),
        };
        let encoding = params.encoding_for(source).ok_or_else(|| {
            FileFailure::InvalidParameters(format!(
                "no output format for {} (unknown source format)",
                source.display()
            ))
        })?;
        Ok((operations, encoding))
    }
}

/// Why one file did not produce an output.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FileFailure {
    /// Rejected before dispatch.
    #[error("{0}")]
    InvalidParameters(String),
    /// The output path is another file's output, or an input of this batch.
    #[error("output {0} collides with another file in this batch")]
    OutputConflict(PathBuf),
    /// The backend failed on this file.
    #[error("{0}")]
    Backend(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub result: Result<FileResult, FileFailure>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    pub success_count: usize,
    pub failed_count: usize,
    /// One entry per input, in input order.
    pub outcomes: Vec<FileOutcome>,
}

impl BatchResult {
    fn from_outcomes(outcomes: Vec<FileOutcome>) -> Self {
        let success_count = outcomes.iter().filter(|o| o.result.is_ok()).count();
        Self {
            success_count,
            failed_count: outcomes.len() - success_count,
            outcomes,
        }
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&Path, &FileFailure)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.path.as_path(), e)))
    }
}

/// Files sharing one resolved parameter set.
struct SubBatch {
    key: String,
    operations: Vec<Operation>,
    encoding: Encoding,
    indices: Vec<usize>,
    jobs: Vec<FileJob>,
}

/// Full SHA-256 hex digest of a parameter set. Files group only on an exact match.
fn group_key(operations: &[Operation], encoding: &Encoding) -> Result<String, FileFailure> {
    let canonical = serde_json::to_vec(&(operations, encoding))
        .map_err(|e| FileFailure::InvalidParameters(format!("unserializable parameters: {e}")))?;
    let digest = Sha256::digest(&canonical);
    Ok(digest.iter().map(|b| format!("{b:02x}")).collect())
}

/// Short form of a group key for log lines.
fn short_key(key: &str) -> &str {
    key.get(..12).unwrap_or(key)
}

/// Run `spec` over `inputs`. Never fails as a whole; see the module docs.
pub fn run_batch<B: ImageBackend>(
    backend: &B,
    inputs: &[ImageInfo],
    spec: &BatchSpec,
    naming: &OutputNaming,
    progress: &ProgressSink,
) -> BatchResult {
    let total = inputs.len();
    let mut outcomes: Vec<Option<Result<FileResult, FileFailure>>> = vec![None; total];
    let mut groups: BTreeMap<String, SubBatch> = BTreeMap::new();
    let mut claimed_outputs: HashSet<PathBuf> = HashSet::new();
    // Outputs must never land on any file this batch reads.
    let sources: HashSet<&Path> = inputs.iter().map(|info| info.path.as_path()).collect();

    for (index, info) in inputs.iter().enumerate() {
        let resolved = spec.resolve(&info.path).and_then(|(operations, encoding)| {
            validate_chain(info.dimensions(), &operations)
                .map_err(|e| FileFailure::InvalidParameters(e.to_string()))?;
            let key = group_key(&operations, &encoding)?;
            Ok((operations, encoding, key))
        });
        let (operations, encoding, key) = match resolved {
            Ok(resolved) => resolved,
            Err(failure) => {
                tracing::warn!(path = %info.path.display(), error = %failure, "rejected before dispatch");
                outcomes[index] = Some(Err(failure));
                continue;
            }
        };

        let output = naming.output_path(&info.path, encoding.format.extension());
        if sources.contains(output.as_path()) || claimed_outputs.contains(&output) {
            tracing::warn!(path = %info.path.display(), output = %output.display(), "output conflict");
            outcomes[index] = Some(Err(FileFailure::OutputConflict(output)));
            continue;
        }
        claimed_outputs.insert(output.clone());

        let group = groups.entry(key.clone()).or_insert_with(|| SubBatch {
            key,
            operations,
            encoding,
            indices: Vec::new(),
            jobs: Vec::new(),
        });
        group.indices.push(index);
        group.jobs.push(FileJob {
            source: info.path.clone(),
            original_size: info.file_size,
            output,
        });
    }

    let rejected = outcomes.iter().filter(|o| o.is_some()).count();
    tracing::info!(
        files = total,
        rejected,
        sub_batches = groups.len(),
        "starting batch"
    );

    // Counter and send share one lock so records arrive in increasing order.
    let processed = Mutex::new(rejected);
    let completed: Vec<(Vec<usize>, Vec<Result<FileResult, FileFailure>>)> = groups
        .into_values()
        .collect::<Vec<_>>()
        .into_par_iter()
        .map(|group| {
            tracing::debug!(
                group = short_key(&group.key),
                files = group.jobs.len(),
                format = %group.encoding.format,
                operations = group.operations.len(),
                "dispatching sub-batch"
            );
            let results: Vec<_> =
                execute_sub_batch(backend, &group.jobs, &group.operations, &group.encoding)
                    .into_iter()
                    .map(|r| r.map_err(|e| FileFailure::Backend(e.to_string())))
                    .collect();
            if let Ok(mut done) = processed.lock() {
                *done += group.indices.len();
                progress.send(Progress::new(*done, total));
            }
            (group.indices, results)
        })
        .collect();

    if completed.is_empty() {
        progress.send(Progress::new(total, total));
    }

    for (indices, results) in completed {
        for (index, result) in indices.into_iter().zip(results) {
            outcomes[index] = Some(result);
        }
    }

    let outcomes: Vec<FileOutcome> = inputs
        .iter()
        .zip(outcomes)
        .map(|(info, result)| FileOutcome {
            path: info.path.clone(),
            result: result.unwrap_or_else(|| {
                Err(FileFailure::Backend("no result returned".to_string()))
            }),
        })
        .collect();

    let result = BatchResult::from_outcomes(outcomes);
    tracing::info!(
        succeeded = result.success_count,
        failed = result.failed_count,
        "batch finished"
    );
    result
}

// ============================================================================
// Task list
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Processing,
    Completed(FileResult),
    Failed(FileFailure),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub info: ImageInfo,
    pub status: TaskStatus,
}

/// A task list bound to one batch spec.
///
/// Files are added once (by path). [`run`](Self::run) processes every
/// pending task; completed and failed tasks stay visible until removed,
/// cleared, or requeued.
#[derive(Debug, Clone)]
pub struct BatchJob {
    spec: BatchSpec,
    tasks: Vec<Task>,
}

impl BatchJob {
    pub fn new(spec: BatchSpec) -> Self {
        Self {
            spec,
            tasks: Vec::new(),
        }
    }

    pub fn spec(&self) -> &BatchSpec {
        &self.spec
    }

    /// Change the spec for future runs. Existing statuses are kept.
    pub fn set_spec(&mut self, spec: BatchSpec) {
        self.spec = spec;
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Add files as pending tasks, skipping paths already in the list.
    /// Returns how many were added.
    pub fn add_files(&mut self, files: impl IntoIterator<Item = ImageInfo>) -> usize {
        let mut added = 0;
        for info in files {
            if self.tasks.iter().any(|t| t.info.path == info.path) {
                tracing::debug!(path = %info.path.display(), "already queued");
                continue;
            }
            self.tasks.push(Task {
                info,
                status: TaskStatus::Pending,
            });
            added += 1;
        }
        added
    }

    pub fn status(&self, path: &Path) -> Option<&TaskStatus> {
        self.tasks
            .iter()
            .find(|t| t.info.path == path)
            .map(|t| &t.status)
    }

    pub fn remove(&mut self, path: &Path) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.info.path != path);
        self.tasks.len() != before
    }

    /// Drop every task. Outputs already written stay on disk.
    pub fn clear(&mut self) {
        self.tasks.clear();
    }

    /// Put failed tasks back to pending. Returns how many were requeued.
    pub fn requeue_failed(&mut self) -> usize {
        let mut count = 0;
        for task in &mut self.tasks {
            if matches!(task.status, TaskStatus::Failed(_)) {
                task.status = TaskStatus::Pending;
                count += 1;
            }
        }
        count
    }

    pub fn pending_count(&self) -> usize {
        self.tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Pending)
            .count()
    }

    /// Mark every pending task as processing and return their images.
    pub fn begin(&mut self) -> Vec<ImageInfo> {
        self.tasks
            .iter_mut()
            .filter(|t| t.status == TaskStatus::Pending)
            .map(|t| {
                t.status = TaskStatus::Processing;
                t.info.clone()
            })
            .collect()
    }

    /// Record outcomes by path. Outcomes for paths no longer in the list
    /// (removed or cleared meanwhile) are ignored.
    pub fn complete(&mut self, result: &BatchResult) {
        for outcome in &result.outcomes {
            if let Some(task) = self.tasks.iter_mut().find(|t| t.info.path == outcome.path) {
                task.status = match &outcome.result {
                    Ok(r) => TaskStatus::Completed(r.clone()),
                    Err(e) => TaskStatus::Failed(e.clone()),
                };
            }
        }
    }

    /// Process every pending task.
    pub fn run<B: ImageBackend>(
        &mut self,
        backend: &B,
        naming: &OutputNaming,
        progress: &ProgressSink,
    ) -> BatchResult {
        let inputs = self.begin();
        let result = run_batch(backend, &inputs, &self.spec, naming, progress);
        self.complete(&result);
        result
    }
}
