//! Append-only status logs.
//!
//! Two flat text files under the configured log directory record per-file
//! outcomes across runs:
//!
//! * `erros_ocr.txt` — general errors, one `"<filename>: <reason>"` line
//!   per event;
//! * `status_conversao.txt` — conversion outcomes,
//!   `"<filename>: sucesso"` or `"<filename>: erro - <reason>"`.
//!
//! Lines are only ever appended — never rewritten, rotated, or
//! deduplicated — so re-running a batch appends fresh entries for the same
//! filenames. Downstream tooling tails and greps these files; the line
//! formats are a compatibility contract.
//!
//! There is exactly one writer (the pipeline is single-threaded), so plain
//! append-mode opens need no locking. A failed append is itself only logged
//! via `tracing` and never aborts the batch.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Filename of the general error log.
pub const ERROR_LOG_FILE: &str = "erros_ocr.txt";

/// Filename of the conversion-status log.
pub const CONVERSION_LOG_FILE: &str = "status_conversao.txt";

/// Conversion outcome as recorded in `status_conversao.txt`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionStatus {
    Success,
    Error(String),
}

/// Handle on the two append-only log files.
#[derive(Debug, Clone)]
pub struct StatusLog {
    dir: PathBuf,
}

impl StatusLog {
    /// Create a handle rooted at `dir`. The directory is created lazily on
    /// first append, not here, so constructing a `StatusLog` never fails.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the general error log.
    pub fn error_log_path(&self) -> PathBuf {
        self.dir.join(ERROR_LOG_FILE)
    }

    /// Path of the conversion-status log.
    pub fn conversion_log_path(&self) -> PathBuf {
        self.dir.join(CONVERSION_LOG_FILE)
    }

    /// Append a `"<filename>: <reason>"` line to the general error log.
    pub fn append_error(&self, filename: &str, reason: &str) {
        self.append_line(&self.error_log_path(), &format!("{filename}: {reason}"));
    }

    /// Append a conversion-status line.
    pub fn append_conversion(&self, filename: &str, status: &ConversionStatus) {
        let line = match status {
            ConversionStatus::Success => format!("{filename}: sucesso"),
            ConversionStatus::Error(reason) => format!("{filename}: erro - {reason}"),
        };
        self.append_line(&self.conversion_log_path(), &line);
    }

    fn append_line(&self, path: &Path, line: &str) {
        if let Err(e) = std::fs::create_dir_all(&self.dir) {
            warn!("Could not create log directory {}: {e}", self.dir.display());
            return;
        }
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .and_then(|mut f| writeln!(f, "{line}"));
        if let Err(e) = result {
            warn!("Could not append to {}: {e}", path.display());
        }
    }
}
