//! Pluggable "does this PDF need OCR?" decision.
//!
//! The pipeline converts every discovered file whose converted counterpart
//! is missing, but the decision of whether a file actually needs OCR is a
//! seam worth keeping open: some deployments receive born-digital PDFs in
//! the same inbox as scans. Two implementations ship:
//!
//! * [`TextProbeDecision`] — local, default: a PDF needs OCR iff no page
//!   yields text. Fast and offline.
//! * [`RemoteAdvisoryDecision`] — asks an Ollama-compatible model for a
//!   SIM/NÃO verdict, feeding it the local probe's finding. Advisory
//!   deployments use this to centralise the policy.

use crate::error::StageError;
use crate::pipeline::pdftext;
use crate::prompts;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Decides whether a PDF still needs OCR conversion.
#[async_trait]
pub trait NeedsOcrDecision: Send + Sync {
    /// `Ok(true)` means the file should go through the OCR engine.
    async fn needs_ocr(&self, pdf_path: &Path) -> Result<bool, StageError>;
}

/// Local decision: a PDF needs OCR when no page yields any text.
///
/// Uses raw extracted text, not the normalized form; a page of pure
/// invisible characters is pathological enough that either answer is
/// defensible and the raw check is cheaper.
#[derive(Debug, Default)]
pub struct TextProbeDecision;

#[async_trait]
impl NeedsOcrDecision for TextProbeDecision {
    async fn needs_ocr(&self, pdf_path: &Path) -> Result<bool, StageError> {
        let pages = pdftext::extract_pages(pdf_path)?;
        let has_text = pages.iter().any(|p| !p.trim().is_empty());
        debug!(
            "text probe for {}: has_text={has_text}",
            pdf_path.display()
        );
        Ok(!has_text)
    }
}

/// Remote advisory decision backed by an Ollama-compatible endpoint.
///
/// Runs the local text probe first, then asks the model to confirm. The
/// model's reply is scanned for a "NÃO" verdict; anything else means OCR.
pub struct RemoteAdvisoryDecision {
    endpoint: String,
    model: String,
    client: reqwest::Client,
}

/// Ollama API request format.
#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
}

/// Ollama API response format.
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

impl RemoteAdvisoryDecision {
    /// `endpoint` is the server base URL, e.g. `http://localhost:11434`.
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            model: model.into(),
            client: reqwest::Client::new(),
        }
    }

    async fn ask(&self, prompt: String) -> Result<String, StageError> {
        let request = OllamaRequest {
            model: self.model.clone(),
            prompt,
            stream: false,
        };
        let url = format!("{}/api/generate", self.endpoint);
        let resp = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| StageError::DecisionFailed {
                detail: format!("request to {url} failed: {e}"),
            })?;
        if !resp.status().is_success() {
            return Err(StageError::DecisionFailed {
                detail: format!("{url} returned {}", resp.status()),
            });
        }
        let body: OllamaResponse =
            resp.json().await.map_err(|e| StageError::DecisionFailed {
                detail: format!("invalid response from {url}: {e}"),
            })?;
        Ok(body.response)
    }
}

#[async_trait]
impl NeedsOcrDecision for RemoteAdvisoryDecision {
    async fn needs_ocr(&self, pdf_path: &Path) -> Result<bool, StageError> {
        let pages = pdftext::extract_pages(pdf_path)?;
        let has_text = pages.iter().any(|p| !p.trim().is_empty());
        let reply = self.ask(prompts::decision_prompt(has_text)).await?;
        let verdict = parse_verdict(&reply);
        debug!(
            "remote advisory for {}: has_text={has_text}, reply={reply:?}, needs_ocr={verdict}",
            pdf_path.display()
        );
        Ok(verdict)
    }
}

/// `false` only when the reply contains an explicit "NÃO"/"NAO"; every other
/// reply, including garbage, falls back to running OCR. Converting a file
/// that did not need it wastes minutes; skipping one that did loses data.
fn parse_verdict(reply: &str) -> bool {
    let upper = reply.to_uppercase();
    !(upper.contains("NÃO") || upper.contains("NAO"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn explicit_negative_verdict_skips_ocr() {
        assert!(!parse_verdict("NÃO"));
        assert!(!parse_verdict("não, este PDF já contém texto"));
        assert!(!parse_verdict("Nao precisa."));
    }

    #[test]
    fn affirmative_or_unclear_verdict_runs_ocr() {
        assert!(parse_verdict("SIM"));
        assert!(parse_verdict("sim, precisa de OCR"));
        assert!(parse_verdict("talvez"));
        assert!(parse_verdict(""));
    }

    #[tokio::test]
    async fn text_probe_errors_on_unreadable_pdf() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"not a pdf").unwrap();
        let decision = TextProbeDecision;
        assert!(decision.needs_ocr(tmp.path()).await.is_err());
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_decision_failure() {
        let decision = RemoteAdvisoryDecision::new("http://127.0.0.1:9", "test-model");
        let err = decision
            .ask(prompts::decision_prompt(false))
            .await
            .unwrap_err();
        assert!(matches!(err, StageError::DecisionFailed { .. }), "got: {err}");
    }
}
