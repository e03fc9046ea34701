//! Result types returned by a pipeline run.
//!
//! The flat status logs (see [`crate::status`]) are the operator-facing
//! record; [`RunSummary`] is the structured, serialisable view of the same
//! run for library callers and the CLI's `--json` output. One
//! [`FileReport`] per discovered input file, plus batch-level [`RunStats`].

use crate::error::StageError;
use serde::{Deserialize, Serialize};

/// Terminal state of one input file after a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileOutcome {
    /// OCR conversion ran this run and the result is usable.
    Converted,
    /// A converted file already existed; conversion was skipped and the
    /// existing file trusted without re-validation.
    SkippedExisting,
    /// The converted output is unreadable; extraction and comparison were
    /// aborted for this file.
    Failed,
    /// The input file vanished between discovery and processing.
    Missing,
}

/// Per-file record of what happened during the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReport {
    /// Input filename (not the full path).
    pub filename: String,

    /// Terminal state for this file.
    pub outcome: FileOutcome,

    /// Whether the converted PDF yielded extractable text on any page.
    /// `Some(false)` is a quality warning, not a failure — extraction still
    /// runs. `None` means the probe never ran (pre-existing conversions are
    /// trusted and skip it).
    pub searchable: Option<bool>,

    /// Whether the per-page CSV was written this run (`false` when it
    /// already existed or extraction failed).
    pub extracted: bool,

    /// Result of the OCR-vs-CSV content heuristic. `None` when the
    /// comparison itself errored or never ran.
    pub content_matches: Option<bool>,

    /// Every advisory error hit while processing this file, in stage order.
    pub errors: Vec<StageError>,

    /// Wall-clock time spent on this file.
    pub duration_ms: u64,
}

impl FileReport {
    pub(crate) fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            outcome: FileOutcome::Missing,
            searchable: None,
            extracted: false,
            content_matches: None,
            errors: Vec::new(),
            duration_ms: 0,
        }
    }
}

/// Batch-level statistics for a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStats {
    /// Qualifying files discovered (after filter and batch cap).
    pub discovered: usize,
    /// Files OCR-converted this run.
    pub converted: usize,
    /// Files whose conversion was skipped because output already existed.
    pub skipped_existing: usize,
    /// Files aborted after an unreadable conversion.
    pub failed: usize,
    /// CSVs written this run.
    pub extracted: usize,
    /// Files whose OCR-vs-CSV comparison passed.
    pub content_matched: usize,
    /// Whether the system report CSV was synthesized at end of run.
    pub system_report_created: bool,
    /// Total wall-clock time for the batch.
    pub total_duration_ms: u64,
}

/// Complete result of a pipeline run.
///
/// Returned by [`crate::run::run`] even when individual files failed; only
/// batch-level problems (bad config, unreadable input directory) surface as
/// `Err`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// One report per discovered file, in processing order.
    pub files: Vec<FileReport>,
    /// Aggregated statistics.
    pub stats: RunStats,
}

impl RunSummary {
    /// Convenience: number of files that reached a usable terminal state.
    pub fn succeeded(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f.outcome, FileOutcome::Converted | FileOutcome::SkippedExisting))
            .count()
    }
}

/// One row-level difference reported by the system-report reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowDifference {
    /// 1-based data-row index in the extracted CSV (header excluded).
    pub row: usize,
    /// The row's field values.
    pub values: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn succeeded_counts_converted_and_skipped() {
        let mut a = FileReport::new("NF1.pdf");
        a.outcome = FileOutcome::Converted;
        let mut b = FileReport::new("NF2.pdf");
        b.outcome = FileOutcome::SkippedExisting;
        let mut c = FileReport::new("NF3.pdf");
        c.outcome = FileOutcome::Failed;

        let summary = RunSummary {
            files: vec![a, b, c],
            stats: RunStats::default(),
        };
        assert_eq!(summary.succeeded(), 2);
    }

    #[test]
    fn summary_round_trips_through_json() {
        let mut report = FileReport::new("NF1.pdf");
        report.outcome = FileOutcome::Converted;
        report.errors.push(StageError::Truncated);

        let summary = RunSummary {
            files: vec![report],
            stats: RunStats {
                discovered: 1,
                converted: 1,
                ..Default::default()
            },
        };
        let json = serde_json::to_string(&summary).unwrap();
        let back: RunSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(back.files.len(), 1);
        assert_eq!(back.files[0].filename, "NF1.pdf");
        assert_eq!(back.stats.converted, 1);
    }
}
