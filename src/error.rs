//! Error types for the invoice2csv library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`PipelineError`] — **Fatal**: the batch run cannot proceed at all
//!   (input directory unreadable, invalid configuration). Returned as
//!   `Err(PipelineError)` from [`crate::run::run`].
//!
//! * [`StageError`] — **Non-fatal**: a single stage of a single file failed
//!   (OCR engine error, corrupt output, comparison mismatch). Recorded in
//!   the status logs and in [`crate::report::FileReport`] so callers can
//!   inspect partial success rather than losing the whole batch to one bad
//!   scan.
//!
//! The separation implements the pipeline's error taxonomy: almost
//! everything degrades to "logged and continue", and a single corrupt input
//! can never halt the batch.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the invoice2csv library.
///
/// Per-file failures use [`StageError`] and are carried in
/// [`crate::report::FileReport`] rather than propagated here.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The configured input directory does not exist or is not a directory.
    #[error("Input directory not found: '{path}'\nCheck the path exists and is readable.")]
    InputDirNotFound { path: PathBuf },

    /// Listing the input directory failed partway through.
    #[error("Failed to list input directory '{path}': {source}")]
    InputDirUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create an output or log directory.
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not synthesize the system report CSV at end of run.
    #[error("Failed to write system report '{path}': {source}")]
    SystemReportWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single stage of a single file.
///
/// The `Display` form of these variants is what lands in the append-only
/// error log as the `<reason>` part of a `"<filename>: <reason>"` line, so
/// the wording stays close to what operators already grep for.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum StageError {
    /// The `ocrmypdf` binary is not installed or not on PATH.
    #[error("OCR engine unavailable: {detail}")]
    EngineUnavailable { detail: String },

    /// The OCR engine ran but exited with an error.
    #[error("Erro na conversão OCR: {detail}")]
    OcrFailed { detail: String },

    /// The OCR engine wrote an output it itself flagged as invalid.
    #[error("PDF gerado como INVÁLIDO pelo OCR (imagem truncada ou corrompida)")]
    EngineFlaggedInvalid,

    /// Byte-marker scan found truncation/invalid-data markers.
    #[error("PDF contém imagem truncada ou dados inválidos após OCR")]
    Truncated,

    /// The converted PDF cannot be opened or parsed.
    #[error("PDF convertido está inválido ou corrompido após OCR")]
    Unreadable,

    /// The converted PDF opened fine but no page yields text.
    #[error("PDF convertido não contém texto pesquisável (qualidade ruim ou truncado)")]
    NotSearchable,

    /// Opening or probing a PDF failed with an engine error.
    #[error("Erro ao verificar PDF: {detail}")]
    ProbeFailed { detail: String },

    /// Per-page extraction or CSV writing failed.
    #[error("Erro na extração para CSV: {detail}")]
    ExtractionFailed { detail: String },

    /// The extracted CSV does not contain the OCR'd PDF text prefix.
    #[error("Diferença entre dados extraídos e PDF OCR gerado")]
    ContentMismatch,

    /// Reading either side of a comparison failed.
    #[error("Erro na comparação dos dados: {detail}")]
    ComparisonFailed { detail: String },

    /// The remote OCR-necessity advisory could not be reached or parsed.
    #[error("Decision service error: {detail}")]
    DecisionFailed { detail: String },
}
