//! Integrity and searchability probes for converted PDFs.
//!
//! Three independent checks with three different severities:
//!
//! * [`is_truncated`] — byte-marker scan of the file head for the strings
//!   the OCR engine embeds when page images were cut off. Advisory only.
//! * [`crate::pipeline::pdftext::page_count`] — can the PDF be opened and
//!   parsed at all? A failure here is fatal for the file: extraction would
//!   only produce garbage.
//! * [`is_searchable`] — does any page yield non-empty normalized text?
//!   A `false` is a quality warning (the OCR ran but recognised nothing),
//!   not a failure; extraction still gets its chance.

use crate::error::StageError;
use crate::pipeline::normalize;
use crate::pipeline::pdftext;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Marker substrings scanned for in the first [`TRUNCATION_SCAN_BYTES`]
/// bytes of a converted PDF.
pub const TRUNCATION_MARKERS: [&[u8]; 3] = [b"truncated", b"invalid jpeg data", b"PDF is INVALID"];

/// How much of the file head the truncation scan reads.
pub const TRUNCATION_SCAN_BYTES: usize = 4096;

/// Accented characters whose presence in extracted text is reported as a
/// diagnostic: their survival is the cheapest signal that the OCR language
/// pack and the text encoding are both right.
const SPECIAL_CHARS: &str = "áéíóúãõâêôçÁÉÍÓÚÃÕÂÊÔÇ";

/// Scan the first 4096 bytes for truncation/invalid-data markers.
///
/// A read failure is returned as `Err` so the caller can log it; the file
/// is then treated as not-flagged (the validity probe will catch anything
/// serious).
pub fn is_truncated(pdf_path: &Path) -> Result<bool, StageError> {
    let head = read_head(pdf_path, TRUNCATION_SCAN_BYTES).map_err(|e| StageError::ProbeFailed {
        detail: format!("{}: {e}", pdf_path.display()),
    })?;
    Ok(TRUNCATION_MARKERS.iter().any(|m| contains(&head, m)))
}

/// Whether any page of the PDF yields non-empty text after normalization.
///
/// Stops at the first page with text. Returns `Err` when the PDF cannot be
/// opened at all; callers treat that the same as not-searchable after
/// logging the reason.
pub fn is_searchable(pdf_path: &Path) -> Result<bool, StageError> {
    let pages = pdftext::extract_pages(pdf_path)?;
    for (i, page) in pages.iter().enumerate() {
        let text = normalize::normalize(page);
        if text.trim().is_empty() {
            debug!("page {}: no text found", i + 1);
            continue;
        }
        let preview: String = text.chars().take(100).collect();
        debug!("page {}: text found: {preview:?}", i + 1);
        let found: Vec<char> = SPECIAL_CHARS.chars().filter(|c| text.contains(*c)).collect();
        if found.is_empty() {
            debug!("no accented characters in extracted text");
        } else {
            debug!("accented characters present: {found:?}");
        }
        return Ok(true);
    }
    Ok(false)
}

/// Read up to `limit` bytes from the start of the file.
fn read_head(path: &Path, limit: usize) -> std::io::Result<Vec<u8>> {
    let mut file = std::fs::File::open(path)?;
    let mut buf = vec![0u8; limit];
    let mut filled = 0;
    // Loop until EOF or the buffer is full; a single read may return short.
    loop {
        let n = file.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
        if filled == buf.len() {
            break;
        }
    }
    buf.truncate(filled);
    Ok(buf)
}

/// Naive substring search over raw bytes.
pub(crate) fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    if needle.is_empty() || haystack.len() < needle.len() {
        return false;
    }
    haystack.windows(needle.len()).any(|w| w == needle)
}
