//! OCR conversion: image-only PDF → searchable PDF via `ocrmypdf`.
//!
//! The engine runs as a subprocess — `ocrmypdf --deskew -l <lang> in out` —
//! because that is the only stable interface it offers. The subprocess
//! boundary also caps the blast radius: an engine crash on a pathological
//! scan becomes a logged [`StageError`], never a crash of the batch.
//!
//! `ocrmypdf` has a failure mode where it exits zero but embeds an
//! "INVALID" marker in the output it wrote; [`reports_invalid`] scans the
//! first 2048 bytes for those markers after every conversion.

use crate::config::PipelineConfig;
use crate::error::StageError;
use crate::pipeline::probe::contains;
use std::io::Read;
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, info};

/// Marker substrings the engine embeds when it considers its own output
/// invalid (truncated or corrupt page images).
pub const INVALID_OUTPUT_MARKERS: [&[u8]; 2] = [
    b"Output file: The generated PDF is INVALID",
    b"PDF is INVALID",
];

/// How much of the output head the invalid-marker scan reads.
pub const INVALID_SCAN_BYTES: usize = 2048;

/// Run the OCR engine on `input`, writing the searchable PDF to `output`.
///
/// No timeout is applied: large multi-page scans legitimately take minutes
/// and the engine has no resumable mode, so killing it mid-run only wastes
/// the work done so far.
pub async fn convert(
    input: &Path,
    output: &Path,
    config: &PipelineConfig,
) -> Result<(), StageError> {
    info!("Starting OCR conversion: {}", input.display());

    let mut cmd = Command::new(&config.ocr_binary);
    if config.deskew {
        cmd.arg("--deskew");
    }
    cmd.args(["--language", &config.ocr_language])
        .arg(input)
        .arg(output);

    let result = cmd.output().await;
    match result {
        Ok(out) if out.status.success() => {
            debug!("OCR conversion finished: {}", output.display());
            Ok(())
        }
        Ok(out) => {
            let stderr = String::from_utf8_lossy(&out.stderr);
            Err(StageError::OcrFailed {
                detail: format!(
                    "{} exited with {}: {}",
                    config.ocr_binary,
                    out.status,
                    last_lines(&stderr, 3)
                ),
            })
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StageError::EngineUnavailable {
            detail: format!("'{}' not found on PATH (install ocrmypdf)", config.ocr_binary),
        }),
        Err(e) => Err(StageError::OcrFailed {
            detail: e.to_string(),
        }),
    }
}

/// Whether the engine flagged its own output as invalid.
///
/// Scans the first 2048 bytes of the written file. A missing or unreadable
/// output simply returns `false` — the validity probe downstream will deal
/// with it.
pub fn reports_invalid(output: &Path) -> bool {
    let mut head = vec![0u8; INVALID_SCAN_BYTES];
    let filled = match std::fs::File::open(output).and_then(|mut f| f.read(&mut head)) {
        Ok(n) => n,
        Err(_) => return false,
    };
    head.truncate(filled);
    INVALID_OUTPUT_MARKERS.iter().any(|m| contains(&head, m))
}

/// Check whether the configured OCR binary is runnable.
pub async fn engine_available(binary: &str) -> bool {
    Command::new(binary)
        .arg("--version")
        .output()
        .await
        .map(|out| out.status.success())
        .unwrap_or(false)
}

/// Last `n` non-empty lines of engine stderr, joined with "; ".
fn last_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn missing_binary_maps_to_engine_unavailable() {
        let config = PipelineConfig::builder()
            .ocr_binary("definitely-not-a-real-ocr-binary")
            .build()
            .unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let err = convert(
            &tmp.path().join("in.pdf"),
            &tmp.path().join("out.pdf"),
            &config,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, StageError::EngineUnavailable { .. }), "got: {err}");
    }

    #[test]
    fn invalid_marker_in_output_is_detected() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"%PDF-1.7\nOutput file: The generated PDF is INVALID\n")
            .unwrap();
        assert!(reports_invalid(tmp.path()));
    }

    #[test]
    fn clean_output_is_not_flagged() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"%PDF-1.7\nperfectly fine content\n").unwrap();
        assert!(!reports_invalid(tmp.path()));
    }

    #[test]
    fn missing_output_is_not_flagged() {
        assert!(!reports_invalid(Path::new("/no/such/out.pdf")));
    }

    #[test]
    fn last_lines_keeps_tail() {
        let text = "one\ntwo\n\nthree\nfour\n";
        assert_eq!(last_lines(text, 2), "three; four");
        assert_eq!(last_lines("only", 3), "only");
    }
}
