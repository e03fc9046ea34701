//! Batch orchestrator.
//!
//! [`run`] drives the whole pipeline for one batch: discovery, per-file
//! processing in sequence, then end-of-run synthesis of the system report.
//! Files are processed strictly one at a time; the OCR engine saturates the
//! machine on its own and interleaved status-log lines would be useless to
//! the operators that tail them.
//!
//! # Idempotency
//!
//! Every stage is gated on the existence of its output artifact: a converted
//! PDF, a staged copy, or a CSV that already exists is never rebuilt.
//! Re-running after a crash therefore resumes where the previous run
//! stopped. The flip side is that a file present in the converted directory
//! is trusted outright — it gets a fresh `sucesso` status line and no
//! re-validation, even if it is corrupt. Delete the artifact to force a
//! redo.
//!
//! # Error handling
//!
//! Only batch-level problems (bad config, unreadable input directory,
//! uncreatable output directories) return `Err`. Everything per-file is
//! recorded in the status logs and the returned [`RunSummary`] and the
//! batch moves on.

use crate::config::PipelineConfig;
use crate::decision::NeedsOcrDecision;
use crate::error::{PipelineError, StageError};
use crate::pipeline::{compare, discover, extract, ocr, pdftext, probe};
use crate::progress::{NoopProgressCallback, ProgressHandle};
use crate::report::{FileOutcome, FileReport, RowDifference, RunStats, RunSummary};
use crate::status::{ConversionStatus, StatusLog};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Run one batch with no progress events and no OCR-necessity advisory.
pub async fn run(config: PipelineConfig) -> Result<RunSummary, PipelineError> {
    run_with_progress(config, Arc::new(NoopProgressCallback)).await
}

/// Run one batch, reporting per-file events to `progress`.
pub async fn run_with_progress(
    config: PipelineConfig,
    progress: ProgressHandle,
) -> Result<RunSummary, PipelineError> {
    run_with_decision(config, progress, None).await
}

/// Run one batch with an optional OCR-necessity decision.
///
/// When `decision` is `Some`, each file whose converted counterpart is
/// missing is first put to the decision; a `needs_ocr == false` verdict
/// copies the input as-is instead of running the engine. A failed decision
/// is logged and falls back to running OCR, never to skipping it.
pub async fn run_with_decision(
    config: PipelineConfig,
    progress: ProgressHandle,
    decision: Option<Arc<dyn NeedsOcrDecision>>,
) -> Result<RunSummary, PipelineError> {
    let run_start = Instant::now();
    prepare_directories(&config)?;
    let status = StatusLog::new(&config.log_dir);

    let candidates = discover::list_candidates(&config)?;
    info!("Discovered {} qualifying file(s)", candidates.len());
    progress.on_run_start(candidates.len());

    let mut stats = RunStats {
        discovered: candidates.len(),
        ..Default::default()
    };
    let total = candidates.len();
    let mut files = Vec::with_capacity(total);

    for (i, candidate) in candidates.into_iter().enumerate() {
        progress.on_file_start(&candidate.filename, i + 1, total);
        let report = process_file(&config, &status, &candidate, decision.as_deref()).await;

        match report.outcome {
            FileOutcome::Converted => stats.converted += 1,
            FileOutcome::SkippedExisting => stats.skipped_existing += 1,
            FileOutcome::Failed => stats.failed += 1,
            FileOutcome::Missing => {}
        }
        if report.extracted {
            stats.extracted += 1;
        }
        if report.content_matches == Some(true) {
            stats.content_matched += 1;
        }

        progress.on_file_complete(&report);
        files.push(report);
    }

    stats.system_report_created = ensure_system_report(&config)?;
    stats.total_duration_ms = run_start.elapsed().as_millis() as u64;
    progress.on_run_complete(&stats);

    Ok(RunSummary { files, stats })
}

/// Drive one file through every stage it still needs.
async fn process_file(
    config: &PipelineConfig,
    status: &StatusLog,
    candidate: &discover::Candidate,
    decision: Option<&dyn NeedsOcrDecision>,
) -> FileReport {
    let filename = &candidate.filename;
    let started = Instant::now();
    let mut report = FileReport::new(filename.clone());

    // Discovery and processing are separate passes; the file can vanish in
    // between. No status line: nothing was attempted.
    if !candidate.path.is_file() {
        warn!("{filename}: disappeared after discovery, skipping");
        report.outcome = FileOutcome::Missing;
        report.duration_ms = started.elapsed().as_millis() as u64;
        return report;
    }

    let converted = config.converted_path(filename);
    if converted.is_file() {
        info!("{filename}: already converted, skipping OCR");
        status.append_conversion(filename, &ConversionStatus::Success);
        report.outcome = FileOutcome::SkippedExisting;
    } else {
        let converted_ok =
            convert_and_validate(config, status, filename, &candidate.path, &converted, decision)
                .await;
        report.outcome = match converted_ok {
            ConversionResult::Usable { searchable, errors } => {
                report.searchable = Some(searchable);
                report.errors.extend(errors);
                FileOutcome::Converted
            }
            ConversionResult::Unusable { errors } => {
                report.errors.extend(errors);
                report.duration_ms = started.elapsed().as_millis() as u64;
                return FileReport {
                    outcome: FileOutcome::Failed,
                    ..report
                };
            }
        };
    }

    // Staging copy for the extractor. A failed copy is console-only; the
    // extraction step right after will fail loudly anyway.
    let staged = config.staged_path(filename);
    if !staged.is_file() {
        if let Err(e) = tokio::fs::copy(&converted, &staged).await {
            error!("{filename}: staging copy failed: {e}");
            report.errors.push(StageError::ExtractionFailed {
                detail: format!("staging copy failed: {e}"),
            });
        }
    }

    // Extraction failures stay out of the shared logs: the operator-facing
    // record tracks conversion health, and a bad extraction is visible as a
    // missing CSV.
    let csv = config.csv_path(filename);
    if csv.is_file() {
        info!("{filename}: CSV already present, skipping extraction");
    } else {
        match extract::extract_to_csv(&staged, &csv) {
            Ok(pages) => {
                info!("{filename}: extracted {pages} page(s)");
                report.extracted = true;
            }
            Err(e) => {
                error!("{filename}: {e}");
                report.errors.push(e);
            }
        }
    }

    // The comparison always runs, even against a stale CSV from a previous
    // run; drift between artifacts is exactly what it exists to catch.
    match compare::matches_ocr_text(&converted, &csv, config.compare_prefix_chars) {
        Ok(true) => {
            info!("{filename}: extracted data matches OCR text");
            report.content_matches = Some(true);
        }
        Ok(false) => {
            warn!("{filename}: extracted data does not match OCR text");
            status.append_error(filename, &StageError::ContentMismatch.to_string());
            report.errors.push(StageError::ContentMismatch);
            report.content_matches = Some(false);
        }
        Err(e) => {
            error!("{filename}: {e}");
            status.append_error(filename, &e.to_string());
            report.errors.push(e);
        }
    }

    report.duration_ms = started.elapsed().as_millis() as u64;
    report
}

enum ConversionResult {
    /// The converted PDF parses; extraction can proceed. `searchable` is the
    /// quality probe's finding, `errors` the advisory findings on the way.
    Usable { searchable: bool, errors: Vec<StageError> },
    /// No usable converted PDF exists; the file is done for this run.
    Unusable { errors: Vec<StageError> },
}

/// Convert one file and run the post-conversion probes.
async fn convert_and_validate(
    config: &PipelineConfig,
    status: &StatusLog,
    filename: &str,
    input: &Path,
    converted: &Path,
    decision: Option<&dyn NeedsOcrDecision>,
) -> ConversionResult {
    let mut errors = Vec::new();

    let needs_ocr = match decision {
        None => true,
        Some(d) => match d.needs_ocr(input).await {
            Ok(v) => v,
            Err(e) => {
                warn!("{filename}: {e}; converting anyway");
                errors.push(e);
                true
            }
        },
    };

    if needs_ocr {
        // An engine error is not fatal on its own: the engine can exit
        // nonzero after writing usable output (a late post-processing step
        // failing, for instance). The probes below judge what is actually
        // on disk; only the parse check decides fatality.
        if let Err(e) = ocr::convert(input, converted, config).await {
            error!("{filename}: {e}");
            status.append_error(filename, &e.to_string());
            errors.push(e);
        }
    } else {
        info!("{filename}: already searchable, copying without OCR");
        if let Err(e) = tokio::fs::copy(input, converted).await {
            let e = StageError::OcrFailed {
                detail: format!("copy of searchable input failed: {e}"),
            };
            error!("{filename}: {e}");
            status.append_error(filename, &e.to_string());
            errors.push(e);
        }
    }

    // The engine sometimes exits zero while marking its own output invalid.
    if ocr::reports_invalid(converted) {
        warn!("{filename}: OCR engine flagged its output as invalid");
        status.append_error(filename, &StageError::EngineFlaggedInvalid.to_string());
        errors.push(StageError::EngineFlaggedInvalid);
    }

    match probe::is_truncated(converted) {
        Ok(true) => {
            warn!("{filename}: truncation markers found in converted PDF");
            status.append_error(filename, &StageError::Truncated.to_string());
            errors.push(StageError::Truncated);
        }
        Ok(false) => {}
        Err(e) => {
            warn!("{filename}: {e}");
            status.append_error(filename, &e.to_string());
            errors.push(e);
        }
    }

    // Parse check. Failure here is terminal for the file: extraction from
    // an unparseable PDF would only produce garbage.
    if let Err(e) = pdftext::page_count(converted) {
        error!("{filename}: converted PDF is unreadable: {e}");
        status.append_error(filename, &StageError::Unreadable.to_string());
        status.append_conversion(
            filename,
            &ConversionStatus::Error(StageError::Unreadable.to_string()),
        );
        errors.push(StageError::Unreadable);
        return ConversionResult::Unusable { errors };
    }

    match probe::is_searchable(converted) {
        Ok(true) => {
            info!("{filename}: converted PDF contains searchable text");
            status.append_conversion(filename, &ConversionStatus::Success);
            ConversionResult::Usable { searchable: true, errors }
        }
        Ok(false) => {
            warn!("{filename}: converted PDF has no searchable text");
            status.append_error(filename, &StageError::NotSearchable.to_string());
            status.append_conversion(
                filename,
                &ConversionStatus::Error(StageError::NotSearchable.to_string()),
            );
            errors.push(StageError::NotSearchable);
            ConversionResult::Usable { searchable: false, errors }
        }
        Err(e) => {
            warn!("{filename}: searchability probe failed: {e}");
            status.append_error(filename, &e.to_string());
            status.append_conversion(filename, &ConversionStatus::Error(e.to_string()));
            errors.push(e);
            ConversionResult::Usable { searchable: false, errors }
        }
    }
}

/// Create the output and log directories up front.
///
/// The input directory is deliberately not created: an absent inbox is an
/// operator mistake that discovery reports as fatal.
fn prepare_directories(config: &PipelineConfig) -> Result<(), PipelineError> {
    for dir in [&config.converted_dir, &config.extracted_dir, &config.log_dir] {
        std::fs::create_dir_all(dir).map_err(|e| PipelineError::CreateDirFailed {
            path: dir.clone(),
            source: e,
        })?;
    }
    Ok(())
}

/// Make sure the system-of-record CSV exists, creating a header-only one
/// when it does not. Returns whether a file was created.
fn ensure_system_report(config: &PipelineConfig) -> Result<bool, PipelineError> {
    let path = config.system_report_path();
    if path.is_file() {
        return Ok(false);
    }
    info!("System report absent, creating empty one: {}", path.display());
    std::fs::write(&path, "pagina,texto\n").map_err(|e| {
        PipelineError::SystemReportWriteFailed {
            path: path.clone(),
            source: e,
        }
    })?;
    Ok(true)
}

/// Compare every extracted CSV against the system-of-record report.
///
/// Returns, per extracted CSV in listing order, the rows carrying values
/// the report does not know. CSVs that fail to parse are logged and
/// skipped. An absent system report is synthesized header-only first, the
/// same as at end of run.
pub fn reconcile_system_report(
    config: &PipelineConfig,
) -> Result<Vec<(String, Vec<RowDifference>)>, PipelineError> {
    ensure_system_report(config)?;
    let system = config.system_report_path();

    let entries = std::fs::read_dir(&config.extracted_dir).map_err(|e| {
        PipelineError::InputDirUnreadable {
            path: config.extracted_dir.clone(),
            source: e,
        }
    })?;

    let mut results = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| PipelineError::InputDirUnreadable {
            path: config.extracted_dir.clone(),
            source: e,
        })?;
        let path = entry.path();
        if !path.is_file() || path == system {
            continue;
        }
        let is_csv = path
            .extension()
            .map(|e| e.eq_ignore_ascii_case("csv"))
            .unwrap_or(false);
        if !is_csv {
            continue;
        }
        let filename = entry.file_name().to_string_lossy().into_owned();
        match compare::diff_against_system(&path, &system) {
            Ok(diffs) => {
                if diffs.is_empty() {
                    info!("{filename}: consistent with system report");
                } else {
                    warn!("{filename}: {} row(s) differ from system report", diffs.len());
                }
                results.push((filename, diffs));
            }
            Err(e) => error!("{filename}: {e}"),
        }
    }
    Ok(results)
}
