//! End-to-end integration tests for invoice2csv.
//!
//! Every test builds a throwaway directory sandbox with `tempfile`, so no
//! fixture files or network access are needed. Tests that require a working
//! `ocrmypdf` install are gated behind the `E2E_OCR_ENABLED` environment
//! variable and skip themselves otherwise.
//!
//! Run with:
//!   cargo test --test e2e -- --nocapture

use invoice2csv::{
    reconcile_system_report, run, FileOutcome, PipelineConfig, StatusLog,
};
use std::path::Path;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// A full directory sandbox: inbox, converted, extracted, log.
struct Sandbox {
    _tmp: tempfile::TempDir,
    config: PipelineConfig,
}

impl Sandbox {
    fn new() -> Self {
        let tmp = tempfile::tempdir().expect("create tempdir");
        let root = tmp.path();
        let config = PipelineConfig::builder()
            .input_dir(root.join("entrada"))
            .converted_dir(root.join("processado"))
            .extracted_dir(root.join("extraido"))
            .log_dir(root.join("log"))
            .build()
            .expect("valid config");
        std::fs::create_dir_all(&config.input_dir).expect("create inbox");
        Self { _tmp: tmp, config }
    }

    fn drop_input(&self, name: &str, content: &[u8]) {
        std::fs::write(self.config.input_dir.join(name), content).expect("write input");
    }

    fn plant_converted(&self, name: &str, content: &[u8]) {
        std::fs::create_dir_all(&self.config.converted_dir).expect("create converted dir");
        std::fs::write(self.config.converted_path(name), content).expect("write converted");
    }

    fn status(&self) -> StatusLog {
        StatusLog::new(&self.config.log_dir)
    }

    fn read_or_empty(&self, path: &Path) -> String {
        std::fs::read_to_string(path).unwrap_or_default()
    }

    fn conversion_log(&self) -> String {
        self.read_or_empty(&self.status().conversion_log_path())
    }

    fn error_log(&self) -> String {
        self.read_or_empty(&self.status().error_log_path())
    }
}

/// Assemble a minimal one-page PDF carrying `text`, with a correct xref
/// table so any parser accepts it.
#[cfg(unix)]
fn minimal_searchable_pdf(text: &str) -> Vec<u8> {
    let content = format!("BT /F1 24 Tf 72 720 Td ({text}) Tj ET");
    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
         /Resources << /Font << /F1 5 0 R >> >> /Contents 4 0 R >>"
            .to_string(),
        format!("<< /Length {} >>\nstream\n{content}\nendstream", content.len()),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
    ];
    let mut out = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::new();
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", i + 1).as_bytes());
    }
    let startxref = out.len();
    out.extend_from_slice(b"xref\n0 6\n0000000000 65535 f \n");
    for offset in &offsets {
        out.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }
    out.extend_from_slice(
        format!("trailer\n<< /Size 6 /Root 1 0 R >>\nstartxref\n{startxref}\n%%EOF\n").as_bytes(),
    );
    out
}

macro_rules! skip_unless_ocr_enabled {
    () => {
        if std::env::var("E2E_OCR_ENABLED").is_err() {
            println!("SKIP — set E2E_OCR_ENABLED=1 (needs ocrmypdf on PATH)");
            return;
        }
    };
}

// ── Discovery ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn only_prefixed_pdfs_are_picked_up() {
    let sandbox = Sandbox::new();
    for name in ["NF1.pdf", "nf2.PDF", "invoice.pdf", "NF3.txt"] {
        sandbox.drop_input(name, b"x");
    }

    let summary = run(sandbox.config.clone()).await.expect("run succeeds");

    let mut names: Vec<&str> = summary.files.iter().map(|f| f.filename.as_str()).collect();
    names.sort_unstable();
    assert_eq!(names, vec!["NF1.pdf", "nf2.PDF"]);
    assert_eq!(summary.stats.discovered, 2);
}

// ── Idempotency ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn preexisting_conversion_skips_ocr_and_logs_success() {
    let sandbox = Sandbox::new();
    sandbox.drop_input("NF1.pdf", b"scanned invoice bytes");
    // Whatever sits in the converted directory is trusted as a prior
    // successful conversion, even garbage like this.
    sandbox.plant_converted("NF1.pdf", b"not a real pdf");

    let summary = run(sandbox.config.clone()).await.expect("run succeeds");

    assert_eq!(summary.stats.skipped_existing, 1);
    assert_eq!(summary.stats.converted, 0);
    assert_eq!(summary.files[0].outcome, FileOutcome::SkippedExisting);
    assert_eq!(summary.files[0].searchable, None, "skip path must not probe");
    assert_eq!(sandbox.conversion_log(), "NF1.pdf: sucesso\n");

    // The garbage still flows to staging, where extraction fails without
    // touching the shared error log, and comparison logs its own failure.
    assert!(sandbox.config.staged_path("NF1.pdf").is_file());
    assert!(!sandbox.config.csv_path("NF1.pdf").exists());
    let errors = sandbox.error_log();
    assert!(
        errors.contains("NF1.pdf: Erro na comparação dos dados"),
        "error log: {errors:?}"
    );
    assert!(
        !errors.contains("extração"),
        "extraction failures must stay out of the shared log: {errors:?}"
    );
}

#[tokio::test]
async fn rerun_appends_fresh_status_lines() {
    let sandbox = Sandbox::new();
    sandbox.drop_input("NF1.pdf", b"scan");
    sandbox.plant_converted("NF1.pdf", b"not a pdf");

    run(sandbox.config.clone()).await.expect("first run");
    run(sandbox.config.clone()).await.expect("second run");

    assert_eq!(
        sandbox.conversion_log(),
        "NF1.pdf: sucesso\nNF1.pdf: sucesso\n"
    );
}

#[tokio::test]
async fn preexisting_csv_is_not_rewritten() {
    let sandbox = Sandbox::new();
    sandbox.drop_input("NF1.pdf", b"scan");
    sandbox.plant_converted("NF1.pdf", b"not a pdf");
    std::fs::create_dir_all(&sandbox.config.extracted_dir).expect("create extracted dir");
    let csv = sandbox.config.csv_path("NF1.pdf");
    std::fs::write(&csv, "pagina,texto\n1,conteúdo antigo\n").expect("write csv");

    let summary = run(sandbox.config.clone()).await.expect("run succeeds");

    assert!(!summary.files[0].extracted);
    let content = std::fs::read_to_string(&csv).expect("read csv");
    assert_eq!(content, "pagina,texto\n1,conteúdo antigo\n");
}

// ── OCR failure path ─────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_engine_is_advisory_and_the_validity_probe_fails_the_file() {
    let sandbox = Sandbox::new();
    sandbox.drop_input("NF1.pdf", b"scan");
    let config = PipelineConfig::builder()
        .input_dir(sandbox.config.input_dir.clone())
        .converted_dir(sandbox.config.converted_dir.clone())
        .extracted_dir(sandbox.config.extracted_dir.clone())
        .log_dir(sandbox.config.log_dir.clone())
        .ocr_binary("no-such-ocr-binary-anywhere")
        .build()
        .expect("valid config");

    let summary = run(config).await.expect("batch still completes");

    // The engine error itself only lands in the general error log; the
    // file fails because no output exists for the parse check to open.
    assert_eq!(summary.stats.failed, 1);
    assert_eq!(summary.files[0].outcome, FileOutcome::Failed);
    let errors = sandbox.error_log();
    assert!(errors.contains("NF1.pdf: OCR engine unavailable"), "error log: {errors:?}");
    assert!(
        errors.contains("NF1.pdf: PDF convertido está inválido ou corrompido após OCR"),
        "error log: {errors:?}"
    );
    assert_eq!(
        sandbox.conversion_log(),
        "NF1.pdf: erro - PDF convertido está inválido ou corrompido após OCR\n"
    );
    // Nothing downstream ran.
    assert!(!sandbox.config.staged_path("NF1.pdf").exists());
    assert!(!sandbox.config.csv_path("NF1.pdf").exists());
}

#[cfg(unix)]
#[tokio::test]
async fn engine_error_with_usable_output_still_reaches_extraction() {
    use std::os::unix::fs::PermissionsExt;

    let sandbox = Sandbox::new();
    sandbox.drop_input("NF1.pdf", b"scan");

    let source = sandbox.config.input_dir.join("prebuilt-output.pdf");
    std::fs::write(&source, minimal_searchable_pdf("NOTA FISCAL 123")).expect("write source");

    // Stand-in engine: writes usable output and then exits nonzero, the way
    // ocrmypdf does when only a late post-processing step fails.
    let engine = sandbox.config.input_dir.join("fake-ocr.sh");
    std::fs::write(
        &engine,
        format!(
            "#!/bin/sh\nfor out; do :; done\ncp '{}' \"$out\"\nexit 6\n",
            source.display()
        ),
    )
    .expect("write stub engine");
    std::fs::set_permissions(&engine, std::fs::Permissions::from_mode(0o755))
        .expect("make stub executable");

    let config = PipelineConfig::builder()
        .input_dir(sandbox.config.input_dir.clone())
        .converted_dir(sandbox.config.converted_dir.clone())
        .extracted_dir(sandbox.config.extracted_dir.clone())
        .log_dir(sandbox.config.log_dir.clone())
        .ocr_binary(engine.to_string_lossy().into_owned())
        .build()
        .expect("valid config");

    let summary = run(config).await.expect("run succeeds");

    // The engine error is logged, but the parseable output carries the
    // file through the probes, staging, and extraction.
    assert_eq!(summary.files[0].outcome, FileOutcome::Converted);
    assert!(sandbox.error_log().contains("NF1.pdf: Erro na conversão OCR"));
    assert!(sandbox.conversion_log().contains("NF1.pdf: sucesso"));
    assert!(sandbox.config.staged_path("NF1.pdf").is_file());
    let csv = std::fs::read_to_string(sandbox.config.csv_path("NF1.pdf")).expect("csv written");
    assert!(csv.starts_with("pagina,texto"), "csv: {csv:?}");
    assert!(csv.contains("NOTA FISCAL"), "csv: {csv:?}");
}

#[cfg(unix)]
#[tokio::test]
async fn truncated_unreadable_output_fails_the_file_before_extraction() {
    use std::os::unix::fs::PermissionsExt;

    let sandbox = Sandbox::new();
    sandbox.drop_input("NF1.pdf", b"scan");

    // Stand-in engine: exits 0 but writes an output whose head carries a
    // truncation marker and which no PDF parser can open.
    let engine = sandbox.config.input_dir.join("fake-ocr.sh");
    std::fs::write(
        &engine,
        "#!/bin/sh\nfor out; do :; done\nprintf '%s' '%PDF-1.7 truncated stream' > \"$out\"\n",
    )
    .expect("write stub engine");
    std::fs::set_permissions(&engine, std::fs::Permissions::from_mode(0o755))
        .expect("make stub executable");

    let config = PipelineConfig::builder()
        .input_dir(sandbox.config.input_dir.clone())
        .converted_dir(sandbox.config.converted_dir.clone())
        .extracted_dir(sandbox.config.extracted_dir.clone())
        .log_dir(sandbox.config.log_dir.clone())
        .ocr_binary(engine.to_string_lossy().into_owned())
        .build()
        .expect("valid config");

    let summary = run(config).await.expect("batch still completes");

    assert_eq!(summary.files[0].outcome, FileOutcome::Failed);
    let errors = sandbox.error_log();
    assert!(
        errors.contains("NF1.pdf: PDF contém imagem truncada ou dados inválidos após OCR"),
        "error log: {errors:?}"
    );
    assert!(
        errors.contains("NF1.pdf: PDF convertido está inválido ou corrompido após OCR"),
        "error log: {errors:?}"
    );
    let conversions = sandbox.conversion_log();
    assert!(
        conversions
            .contains("NF1.pdf: erro - PDF convertido está inválido ou corrompido após OCR"),
        "conversion log: {conversions:?}"
    );
    // Extraction and comparison never ran.
    assert!(!sandbox.config.staged_path("NF1.pdf").exists());
    assert!(!sandbox.config.csv_path("NF1.pdf").exists());
}

// ── System report synthesis ──────────────────────────────────────────────────

#[tokio::test]
async fn empty_inbox_still_creates_header_only_system_report() {
    let sandbox = Sandbox::new();

    let summary = run(sandbox.config.clone()).await.expect("run succeeds");

    assert_eq!(summary.stats.discovered, 0);
    assert!(summary.stats.system_report_created);
    let content =
        std::fs::read_to_string(sandbox.config.system_report_path()).expect("report exists");
    assert_eq!(content, "pagina,texto\n");
}

#[tokio::test]
async fn existing_system_report_survives_the_run() {
    let sandbox = Sandbox::new();
    std::fs::create_dir_all(&sandbox.config.extracted_dir).expect("create extracted dir");
    std::fs::write(
        sandbox.config.system_report_path(),
        "pagina,texto\n1,registro\n",
    )
    .expect("write report");

    let summary = run(sandbox.config.clone()).await.expect("run succeeds");

    assert!(!summary.stats.system_report_created);
    let content =
        std::fs::read_to_string(sandbox.config.system_report_path()).expect("read report");
    assert_eq!(content, "pagina,texto\n1,registro\n");
}

// ── Reconciliation ───────────────────────────────────────────────────────────

#[tokio::test]
async fn reconcile_reports_rows_missing_from_system_report() {
    let sandbox = Sandbox::new();
    std::fs::create_dir_all(&sandbox.config.extracted_dir).expect("create extracted dir");
    std::fs::write(
        sandbox.config.system_report_path(),
        "pagina,texto\n1,NOTA FISCAL 100\n",
    )
    .expect("write report");
    std::fs::write(
        sandbox.config.csv_path("NF1.pdf"),
        "pagina,texto\n1,NOTA FISCAL 100\n",
    )
    .expect("write csv");
    std::fs::write(
        sandbox.config.csv_path("NF2.pdf"),
        "pagina,texto\n1,NOTA FISCAL 200\n",
    )
    .expect("write csv");

    let mut results = reconcile_system_report(&sandbox.config).expect("reconcile succeeds");
    results.sort_by(|a, b| a.0.cmp(&b.0));

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].0, "NF1.csv");
    assert!(results[0].1.is_empty());
    assert_eq!(results[1].0, "NF2.csv");
    assert_eq!(results[1].1.len(), 1);
    assert_eq!(results[1].1[0].values, vec!["1", "NOTA FISCAL 200"]);
}

// ── Full pipeline with a real engine (gated) ─────────────────────────────────

#[tokio::test]
async fn full_pipeline_with_real_ocr_engine() {
    skip_unless_ocr_enabled!();
    let sandbox = Sandbox::new();
    let fixture = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("test_cases/NF_sample.pdf");
    if !fixture.exists() {
        println!("SKIP — test file not found: {}", fixture.display());
        return;
    }
    std::fs::copy(&fixture, sandbox.config.input_dir.join("NF_sample.pdf"))
        .expect("copy fixture");

    let summary = run(sandbox.config.clone()).await.expect("run succeeds");

    assert_eq!(summary.stats.converted, 1);
    assert_eq!(summary.files[0].outcome, FileOutcome::Converted);
    assert!(sandbox.config.converted_path("NF_sample.pdf").is_file());
    assert!(sandbox.config.csv_path("NF_sample.pdf").is_file());
    let csv = std::fs::read_to_string(sandbox.config.csv_path("NF_sample.pdf"))
        .expect("read csv");
    assert!(csv.starts_with("pagina,texto\n"));
    assert!(sandbox.conversion_log().contains("NF_sample.pdf: sucesso"));
}
