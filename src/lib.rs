//! # invoice2csv
//!
//! Idempotent batch pipeline that turns scanned invoice PDFs into
//! per-page CSVs via OCR.
//!
//! ## Why this crate?
//!
//! Scanned invoices ("notas fiscais") arrive as image-only PDFs that no
//! downstream system can search or import. This crate OCRs them with
//! `ocrmypdf`, validates the result, extracts the text page by page into
//! CSV, and cross-checks the artifacts against each other and against a
//! system-of-record report. Every stage is gated on the existence of its
//! output file, so interrupted batches resume instead of redoing work, and
//! every outcome lands in append-only status logs operators already tail.
//!
//! ## Pipeline Overview
//!
//! ```text
//! NF*.pdf (inbox)
//!  │
//!  ├─ 1. Discover  prefix + extension filter, capped per batch
//!  ├─ 2. OCR       ocrmypdf --deskew -l por (subprocess)
//!  ├─ 3. Probe     invalid markers, truncation, parse, searchability
//!  ├─ 4. Stage     copy searchable PDF into the extraction directory
//!  ├─ 5. Extract   one CSV row per page (pagina,texto)
//!  └─ 6. Compare   CSV vs OCR text prefix, rows vs system report
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use invoice2csv::{run, PipelineConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PipelineConfig::builder()
//!         .input_dir("data/entrada")
//!         .converted_dir("data/processado")
//!         .extracted_dir("data/extraido")
//!         .log_dir("data/log")
//!         .build()?;
//!     let summary = run(config).await?;
//!     println!("{} of {} file(s) processed",
//!         summary.succeeded(),
//!         summary.stats.discovered);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `invoice2csv` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! invoice2csv = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod decision;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod report;
pub mod run;
pub mod status;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{PipelineConfig, PipelineConfigBuilder};
pub use decision::{NeedsOcrDecision, RemoteAdvisoryDecision, TextProbeDecision};
pub use error::{PipelineError, StageError};
pub use progress::{NoopProgressCallback, ProgressHandle, RunProgressCallback};
pub use report::{FileOutcome, FileReport, RowDifference, RunStats, RunSummary};
pub use run::{reconcile_system_report, run, run_with_decision, run_with_progress};
pub use status::{ConversionStatus, StatusLog};
