//! Progress-callback trait for per-file batch events.
//!
//! Pass an [`Arc<dyn RunProgressCallback>`] to
//! [`crate::run::run_with_progress`] to receive real-time events as the
//! pipeline works through the batch.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: callers can
//! forward events to a channel, a database record, or a terminal progress
//! line without the library knowing anything about how the host application
//! communicates. The trait is `Send + Sync` so handles can be shared with
//! spawned tasks even though the batch itself runs files sequentially.
//!
//! # Example
//!
//! ```rust
//! use invoice2csv::{RunProgressCallback, FileReport};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: Arc<AtomicUsize>,
//! }
//!
//! impl RunProgressCallback for CountingCallback {
//!     fn on_file_complete(&self, report: &FileReport) {
//!         let done = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
//!         eprintln!("{} done ({} so far)", report.filename, done);
//!     }
//! }
//!
//! let counter: Arc<dyn RunProgressCallback> = Arc::new(CountingCallback {
//!     completed: Arc::new(AtomicUsize::new(0)),
//! });
//! # let _ = counter;
//! ```

use crate::report::{FileReport, RunStats};
use std::sync::Arc;

/// Called by the batch orchestrator as it processes each file.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait RunProgressCallback: Send + Sync {
    /// Called once after discovery, before any file is processed.
    ///
    /// # Arguments
    /// * `total_files` — number of qualifying files in this batch
    fn on_run_start(&self, total_files: usize) {
        let _ = total_files;
    }

    /// Called just before a file enters the pipeline.
    ///
    /// # Arguments
    /// * `filename` — bare input filename
    /// * `index`    — 1-indexed position in the batch
    /// * `total`    — total files in the batch
    fn on_file_start(&self, filename: &str, index: usize, total: usize) {
        let _ = (filename, index, total);
    }

    /// Called when a file reaches its terminal state, whatever that is.
    fn on_file_complete(&self, report: &FileReport) {
        let _ = report;
    }

    /// Called once after every file has been attempted.
    fn on_run_complete(&self, stats: &RunStats) {
        let _ = stats;
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// This is what [`crate::run::run`] uses internally.
pub struct NoopProgressCallback;

impl RunProgressCallback for NoopProgressCallback {}

/// Convenience alias for the handle [`crate::run::run_with_progress`] takes.
pub type ProgressHandle = Arc<dyn RunProgressCallback>;
