//! CLI binary for invoice2csv.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `PipelineConfig` and prints per-file results.

use anyhow::{Context, Result};
use clap::Parser;
use invoice2csv::{
    reconcile_system_report, run_with_decision, FileOutcome, FileReport, NeedsOcrDecision,
    PipelineConfig, ProgressHandle, RemoteAdvisoryDecision, RunProgressCallback, RunStats,
    TextProbeDecision,
};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback ────────────────────────────────────────────────────

/// Terminal progress: one line per file as it completes. The OCR engine can
/// take minutes per file, so per-file lines beat a progress bar that sits
/// still.
struct CliProgressCallback;

impl RunProgressCallback for CliProgressCallback {
    fn on_run_start(&self, total_files: usize) {
        eprintln!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Processing {total_files} file(s)…"))
        );
    }

    fn on_file_start(&self, filename: &str, index: usize, total: usize) {
        eprintln!("  {} {filename} ({index}/{total})", dim("→"));
    }

    fn on_file_complete(&self, report: &FileReport) {
        let (tick, label) = match report.outcome {
            FileOutcome::Converted => (green("✓"), "converted".to_string()),
            FileOutcome::SkippedExisting => (green("✓"), "already converted".to_string()),
            FileOutcome::Failed => (red("✗"), "failed".to_string()),
            FileOutcome::Missing => (red("✗"), "missing".to_string()),
        };
        let extras = [
            (report.searchable == Some(false)).then(|| "no text".to_string()),
            report.extracted.then(|| "csv written".to_string()),
            (report.content_matches == Some(false)).then(|| "content mismatch".to_string()),
        ];
        let extras: Vec<String> = extras.into_iter().flatten().collect();
        let suffix = if extras.is_empty() {
            String::new()
        } else {
            format!("  {}", dim(&format!("({})", extras.join(", "))))
        };
        eprintln!(
            "  {tick} {}  {label}{suffix}  {}",
            report.filename,
            dim(&format!("{:.1}s", report.duration_ms as f64 / 1000.0)),
        );
        for error in &report.errors {
            eprintln!("      {}", red(&error.to_string()));
        }
    }

    fn on_run_complete(&self, stats: &RunStats) {
        let converted = stats.converted + stats.skipped_existing;
        if stats.failed == 0 {
            eprintln!(
                "{} {} of {} file(s) processed",
                green("✔"),
                bold(&converted.to_string()),
                stats.discovered,
            );
        } else {
            eprintln!(
                "{} {}/{} file(s) processed  ({} failed)",
                cyan("⚠"),
                bold(&converted.to_string()),
                stats.discovered,
                red(&stats.failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Process the default directories (data/entrada → data/processado, data/extraido)
  invoice2csv

  # Explicit directories
  invoice2csv --input-dir /scans/inbox --converted-dir /scans/ocr \
              --extracted-dir /scans/csv --log-dir /scans/log

  # Larger batch, different invoice prefix
  invoice2csv --limit 50 --prefix FAT

  # Skip OCR for PDFs that already contain text
  invoice2csv --decision probe

  # Ask a local Ollama model to confirm the OCR decision
  invoice2csv --decision remote --llm-endpoint http://localhost:11434 --llm-model llama3.2

  # Compare extracted CSVs against the system report instead of processing
  invoice2csv --reconcile

  # Machine-readable summary
  invoice2csv --json > summary.json

PIPELINE STAGES (each skipped when its output already exists):
  1. OCR        ocrmypdf --deskew -l <language> <inbox>/NF1.pdf <converted>/NF1.pdf
  2. Validate   invalid-output markers, truncation markers, parse check
  3. Stage      copy the searchable PDF into the extraction directory
  4. Extract    <extracted>/NF1.csv with one (pagina,texto) row per page
  5. Compare    CSV must contain the leading text of the OCR'd PDF

STATUS LOGS (append-only, under --log-dir):
  erros_ocr.txt          "<filename>: <reason>" per error event
  status_conversao.txt   "<filename>: sucesso" or "<filename>: erro - <reason>"

ENVIRONMENT VARIABLES:
  INVOICE2CSV_INPUT_DIR      Inbox directory
  INVOICE2CSV_CONVERTED_DIR  Searchable-PDF output directory
  INVOICE2CSV_EXTRACTED_DIR  CSV output directory
  INVOICE2CSV_LOG_DIR        Status-log directory
  INVOICE2CSV_OCR_BINARY     OCR engine binary (default: ocrmypdf)
  INVOICE2CSV_LANGUAGE       OCR language (default: por)

SETUP:
  1. Install the engine:  pip install ocrmypdf  (needs tesseract-ocr-por)
  2. Drop scans named NF<number>.pdf into the inbox
  3. Run:                 invoice2csv
"#;

/// Convert scanned invoice PDFs to searchable PDFs and per-page CSVs.
#[derive(Parser, Debug)]
#[command(
    name = "invoice2csv",
    version,
    about = "OCR scanned invoice PDFs and extract their text to per-page CSVs",
    long_about = "Batch-process scanned invoice PDFs: OCR them into searchable PDFs with \
ocrmypdf, validate the results, extract the text page by page into CSV files, and check the \
artifacts against each other and against a system-of-record report. Every stage is skipped \
when its output file already exists, so interrupted batches resume where they stopped.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Directory scanned invoices arrive in.
    #[arg(long, env = "INVOICE2CSV_INPUT_DIR", default_value = "data/entrada")]
    input_dir: PathBuf,

    /// Directory for OCR'd (searchable) PDFs.
    #[arg(long, env = "INVOICE2CSV_CONVERTED_DIR", default_value = "data/processado")]
    converted_dir: PathBuf,

    /// Directory for staged PDFs and extracted CSVs.
    #[arg(long, env = "INVOICE2CSV_EXTRACTED_DIR", default_value = "data/extraido")]
    extracted_dir: PathBuf,

    /// Directory for the append-only status logs.
    #[arg(long, env = "INVOICE2CSV_LOG_DIR", default_value = "data/log")]
    log_dir: PathBuf,

    /// System-of-record CSV path. Default: <extracted-dir>/relatorio_sistema.csv.
    #[arg(long, env = "INVOICE2CSV_SYSTEM_REPORT")]
    system_report: Option<PathBuf>,

    /// Case-insensitive filename prefix an input must carry.
    #[arg(long, env = "INVOICE2CSV_PREFIX", default_value = "NF")]
    prefix: String,

    /// Maximum files processed per run.
    #[arg(short, long, env = "INVOICE2CSV_LIMIT", default_value_t = 10)]
    limit: usize,

    /// OCR recognition language (tesseract code, e.g. por, eng, por+eng).
    #[arg(long, env = "INVOICE2CSV_LANGUAGE", default_value = "por")]
    language: String,

    /// Disable the engine's deskew pass.
    #[arg(long, env = "INVOICE2CSV_NO_DESKEW")]
    no_deskew: bool,

    /// OCR engine binary name or path.
    #[arg(long, env = "INVOICE2CSV_OCR_BINARY", default_value = "ocrmypdf")]
    ocr_binary: String,

    /// Leading characters of OCR text that must appear in the CSV.
    #[arg(long, env = "INVOICE2CSV_COMPARE_PREFIX", default_value_t = 100)]
    compare_prefix: usize,

    /// When to OCR a file whose converted output is missing.
    #[arg(long, env = "INVOICE2CSV_DECISION", value_enum, default_value = "always")]
    decision: DecisionArg,

    /// Ollama-compatible endpoint for --decision remote.
    #[arg(long, env = "INVOICE2CSV_LLM_ENDPOINT", default_value = "http://localhost:11434")]
    llm_endpoint: String,

    /// Model name for --decision remote.
    #[arg(long, env = "INVOICE2CSV_LLM_MODEL", default_value = "llama3.2")]
    llm_model: String,

    /// Compare extracted CSVs against the system report; no processing.
    #[arg(long)]
    reconcile: bool,

    /// Output the run summary as JSON on stdout.
    #[arg(long, env = "INVOICE2CSV_JSON")]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "INVOICE2CSV_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "INVOICE2CSV_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum DecisionArg {
    /// Always run the engine (a converted file only exists if OCR made it).
    Always,
    /// Local text probe: skip OCR when the input already has text.
    Probe,
    /// Remote advisory: ask an Ollama-compatible model to confirm.
    Remote,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli)?;

    // ── Reconcile-only mode ──────────────────────────────────────────────
    if cli.reconcile {
        let results = reconcile_system_report(&config).context("Reconciliation failed")?;
        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&results).context("Failed to serialise results")?
            );
            return Ok(());
        }
        for (filename, diffs) in &results {
            if diffs.is_empty() {
                println!("{} {filename}: consistent with system report", green("✓"));
            } else {
                println!(
                    "{} {filename}: {} row(s) not in system report",
                    red("✗"),
                    diffs.len()
                );
                for diff in diffs {
                    println!("    row {}: {}", diff.row, dim(&diff.values.join(" | ")));
                }
            }
        }
        return Ok(());
    }

    // ── Run the batch ────────────────────────────────────────────────────
    let progress: ProgressHandle = if cli.quiet || cli.json {
        Arc::new(invoice2csv::NoopProgressCallback)
    } else {
        Arc::new(CliProgressCallback)
    };

    let decision: Option<Arc<dyn NeedsOcrDecision>> = match cli.decision {
        DecisionArg::Always => None,
        DecisionArg::Probe => Some(Arc::new(TextProbeDecision)),
        DecisionArg::Remote => Some(Arc::new(RemoteAdvisoryDecision::new(
            cli.llm_endpoint.clone(),
            cli.llm_model.clone(),
        ))),
    };

    let summary = run_with_decision(config, progress, decision)
        .await
        .context("Pipeline run failed")?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?
        );
    }

    // A completed batch exits 0 even when individual files failed; the
    // status logs and summary carry the per-file verdicts.
    Ok(())
}

/// Map CLI args to `PipelineConfig`.
fn build_config(cli: &Cli) -> Result<PipelineConfig> {
    let mut builder = PipelineConfig::builder()
        .input_dir(&cli.input_dir)
        .converted_dir(&cli.converted_dir)
        .extracted_dir(&cli.extracted_dir)
        .log_dir(&cli.log_dir)
        .filename_prefix(&cli.prefix)
        .batch_limit(cli.limit)
        .ocr_language(&cli.language)
        .deskew(!cli.no_deskew)
        .ocr_binary(&cli.ocr_binary)
        .compare_prefix_chars(cli.compare_prefix);

    if let Some(ref path) = cli.system_report {
        builder = builder.system_report(path);
    }

    builder.build().context("Invalid configuration")
}
