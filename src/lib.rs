//! # cropline
//!
//! The interactive core of an image editor, plus the batch machinery that
//! applies its edits to many files: crop-overlay geometry, a validated and
//! undoable transform pipeline, and a batch coordinator that never loses a
//! file's outcome.
//!
//! # Architecture: Edit, Then Batch
//!
//! ```text
//! pointer events ─▶ crop (viewport ▸ drag ▸ constrain) ─▶ pipeline (validate, undo/redo)
//!                                                               │
//! selected files ─▶ selection (allow-list, identify) ─▶ batch (resolve ▸ group ▸ dispatch)
//!                                                               │
//!                                                 imaging backend (one method per op)
//! ```
//!
//! Geometry is total: [`crop::constrain`] turns any candidate rectangle into
//! a valid crop, so errors there are prevented rather than reported. Operation
//! parameters are validated against the image each step actually receives
//! before anything is dispatched. Backend failures are captured per file and
//! never abort a batch.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`crop`] | Viewport mapping, crop constraint engine, drag-handle state machine |
//! | [`pipeline`] | Operation model, per-kind validation, undo/redo history |
//! | [`session`] | Per-image editing session driven by command messages |
//! | [`imaging`] | `ImageBackend` trait, `image`-crate backend, encoding parameters |
//! | [`selection`] | Extension allow-list, directory expansion, metadata query |
//! | [`batch`] | Batch coordinator, sub-batch grouping, task list |
//! | [`progress`] | Cancellable progress subscription |
//! | [`naming`] | Output path generation |
//! | [`config`] | `config.toml` loading, validation, and merging |
//! | [`output`] | CLI output formatting |
//! | [`logging`] | `tracing` subscriber setup for the binary |
//! | [`types`] | Shared `Dimensions` and `ImageInfo` |
//!
//! # Design Decisions
//!
//! ## Typed Backend Interface
//!
//! The backend exposes one method per operation kind. The pipeline is a
//! tagged enum, and [`imaging::apply_operations`] matches on it, so adding
//! an operation is a compile error everywhere it is not yet handled.
//!
//! ## Undo by Edit, Not by Pixels
//!
//! History stores the edit that was made to the operation list (insert,
//! remove, replace, move) with enough data to reverse it. Undo never
//! re-renders anything; the preview is re-derived from the list.
//!
//! ## One Call per Parameter Group
//!
//! A batch is split into sub-batches of files with identical resolved
//! parameters (operations + output encoding). Each sub-batch is one backend
//! call and the unit of progress reporting.

pub mod batch;
pub mod config;
pub mod crop;
pub mod imaging;
pub mod logging;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod selection;
pub mod session;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
