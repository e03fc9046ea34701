//! Configuration for a batch pipeline run.
//!
//! All run behaviour is controlled through [`PipelineConfig`], built via its
//! [`PipelineConfigBuilder`]. Keeping every knob in one struct — directories,
//! filename filters, OCR flags, comparison heuristics — means there is no
//! global state and no hardcoded path anywhere in the library: two runs with
//! the same config are the same run.
//!
//! # Design choice: builder over constructor
//! The original deployment of this pipeline grew a constant for every
//! directory it touched. A builder with validated defaults keeps call sites
//! short while making every location explicit and overridable.

use crate::error::PipelineError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default filename prefix an input scan must carry (case-insensitive).
///
/// Scanned invoices arrive named `NF<number>.pdf` ("nota fiscal"); anything
/// else in the inbox is ignored.
pub const DEFAULT_FILENAME_PREFIX: &str = "NF";

/// Default cap on how many qualifying files a single run processes.
pub const DEFAULT_BATCH_LIMIT: usize = 10;

/// Default OCR recognition language passed to the engine.
pub const DEFAULT_OCR_LANGUAGE: &str = "por";

/// Default number of leading characters of the OCR'd PDF text that must
/// appear verbatim in the extracted CSV for the comparison to pass.
pub const DEFAULT_COMPARE_PREFIX_CHARS: usize = 100;

/// Configuration for a pipeline run.
///
/// Built via [`PipelineConfig::builder()`].
///
/// # Example
/// ```rust
/// use invoice2csv::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .input_dir("data/entrada")
///     .converted_dir("data/processado")
///     .extracted_dir("data/extraido")
///     .log_dir("data/log")
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Directory the scanner drops input PDFs into. Never written to.
    pub input_dir: PathBuf,

    /// Directory for OCR'd (searchable) PDFs. A file already present here is
    /// treated as a prior successful conversion and is not re-validated.
    pub converted_dir: PathBuf,

    /// Working directory for extraction: converted PDFs are copied here and
    /// the per-page CSVs are written next to them.
    pub extracted_dir: PathBuf,

    /// Directory holding the two append-only status logs.
    pub log_dir: PathBuf,

    /// Path of the system-of-record CSV. If absent at end of run, an empty
    /// one with only the header row is created. Defaults to
    /// `<extracted_dir>/relatorio_sistema.csv` when not set explicitly.
    pub system_report: Option<PathBuf>,

    /// Case-insensitive filename prefix filter. Default: `"NF"`.
    pub filename_prefix: String,

    /// Maximum qualifying files processed per run, in listing order.
    /// Default: 10.
    pub batch_limit: usize,

    /// OCR recognition language (`ocrmypdf -l`). Default: `"por"`.
    pub ocr_language: String,

    /// Whether to pass `--deskew` to the OCR engine. Default: true.
    ///
    /// Scanner feed misalignment is the dominant quality problem for these
    /// batches; deskew costs seconds per page and recovers otherwise
    /// unreadable lines.
    pub deskew: bool,

    /// OCR engine binary name or path. Default: `"ocrmypdf"`.
    pub ocr_binary: String,

    /// Leading characters of PDF text the OCR-vs-CSV heuristic looks for in
    /// the CSV. Default: 100.
    ///
    /// This is a substring-containment heuristic, not a structural diff: it
    /// can false-negative on whitespace or encoding differences and
    /// false-positive on coincidental substrings. It is kept configurable
    /// rather than "fixed" to an exact comparison because downstream tooling
    /// greps the mismatch log lines it produces.
    pub compare_prefix_chars: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("data/entrada"),
            converted_dir: PathBuf::from("data/processado"),
            extracted_dir: PathBuf::from("data/extraido"),
            log_dir: PathBuf::from("data/log"),
            system_report: None,
            filename_prefix: DEFAULT_FILENAME_PREFIX.to_string(),
            batch_limit: DEFAULT_BATCH_LIMIT,
            ocr_language: DEFAULT_OCR_LANGUAGE.to_string(),
            deskew: true,
            ocr_binary: "ocrmypdf".to_string(),
            compare_prefix_chars: DEFAULT_COMPARE_PREFIX_CHARS,
        }
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }

    /// Resolved path of the system-of-record CSV.
    pub fn system_report_path(&self) -> PathBuf {
        self.system_report
            .clone()
            .unwrap_or_else(|| self.extracted_dir.join("relatorio_sistema.csv"))
    }

    /// Path the converted counterpart of `filename` lives at.
    pub fn converted_path(&self, filename: &str) -> PathBuf {
        self.converted_dir.join(filename)
    }

    /// Path of the staging copy used by the extractor.
    pub fn staged_path(&self, filename: &str) -> PathBuf {
        self.extracted_dir.join(filename)
    }

    /// Path of the per-page CSV for `filename` (extension swapped).
    pub fn csv_path(&self, filename: &str) -> PathBuf {
        let mut p = self.extracted_dir.join(filename);
        p.set_extension("csv");
        p
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn input_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.input_dir = dir.into();
        self
    }

    pub fn converted_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.converted_dir = dir.into();
        self
    }

    pub fn extracted_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.extracted_dir = dir.into();
        self
    }

    pub fn log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.log_dir = dir.into();
        self
    }

    pub fn system_report(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.system_report = Some(path.into());
        self
    }

    pub fn filename_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.filename_prefix = prefix.into();
        self
    }

    pub fn batch_limit(mut self, n: usize) -> Self {
        self.config.batch_limit = n;
        self
    }

    pub fn ocr_language(mut self, lang: impl Into<String>) -> Self {
        self.config.ocr_language = lang.into();
        self
    }

    pub fn deskew(mut self, v: bool) -> Self {
        self.config.deskew = v;
        self
    }

    pub fn ocr_binary(mut self, bin: impl Into<String>) -> Self {
        self.config.ocr_binary = bin.into();
        self
    }

    pub fn compare_prefix_chars(mut self, n: usize) -> Self {
        self.config.compare_prefix_chars = n;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, PipelineError> {
        let c = &self.config;
        if c.batch_limit == 0 {
            return Err(PipelineError::InvalidConfig(
                "batch_limit must be ≥ 1".into(),
            ));
        }
        if c.compare_prefix_chars == 0 {
            return Err(PipelineError::InvalidConfig(
                "compare_prefix_chars must be ≥ 1".into(),
            ));
        }
        if c.ocr_language.is_empty() {
            return Err(PipelineError::InvalidConfig(
                "ocr_language must not be empty".into(),
            ));
        }
        if c.converted_dir == c.input_dir {
            return Err(PipelineError::InvalidConfig(
                "converted_dir must differ from input_dir (the pipeline never writes to the inbox)"
                    .into(),
            ));
        }
        Ok(self.config)
    }
}
