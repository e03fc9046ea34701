//! Content comparison heuristics.
//!
//! Two comparisons, both advisory:
//!
//! * [`matches_ocr_text`] — does the extracted CSV still contain the text of
//!   the OCR'd PDF it was derived from? A prefix-containment check, not a
//!   structural diff; see [`text_matches`] for the exact rule.
//! * [`diff_against_system`] — which rows of an extracted CSV carry values
//!   the system-of-record report has never seen? Column-wise set membership,
//!   so row order and duplicates in the report do not matter.

use crate::error::StageError;
use crate::pipeline::pdftext;
use crate::report::RowDifference;
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

/// Whether the first `prefix_chars` characters of the PDF text appear
/// verbatim in the CSV text.
///
/// Both sides must be non-blank; an empty side is an automatic mismatch (a
/// CSV with no content cannot vouch for anything). Trimming only gates
/// blankness: the prefix itself is cut from the raw text, leading
/// whitespace and all. The cut respects char boundaries, so multi-byte
/// Portuguese characters never split.
pub fn text_matches(pdf_text: &str, csv_text: &str, prefix_chars: usize) -> bool {
    if pdf_text.trim().is_empty() || csv_text.trim().is_empty() {
        return false;
    }
    let prefix: String = pdf_text.chars().take(prefix_chars).collect();
    csv_text.contains(&prefix)
}

/// Compare the converted PDF at `pdf_path` against the CSV at `csv_path`.
///
/// The PDF side is the space-joined text of all pages; the CSV side is the
/// raw file content (header, quotes and all — the prefix is sought anywhere
/// in it). Returns `Err` when either side cannot be read.
pub fn matches_ocr_text(
    pdf_path: &Path,
    csv_path: &Path,
    prefix_chars: usize,
) -> Result<bool, StageError> {
    let pages = pdftext::extract_pages(pdf_path).map_err(|e| StageError::ComparisonFailed {
        detail: e.to_string(),
    })?;
    let pdf_text = pages.join(" ");
    let csv_text =
        std::fs::read_to_string(csv_path).map_err(|e| StageError::ComparisonFailed {
            detail: format!("{}: {e}", csv_path.display()),
        })?;
    let matched = text_matches(&pdf_text, &csv_text, prefix_chars);
    debug!(
        "comparison for {}: prefix of {} chars {}",
        pdf_path.display(),
        prefix_chars,
        if matched { "found" } else { "not found" }
    );
    Ok(matched)
}

/// Rows of `extracted_csv` holding any value absent from the same column of
/// `system_csv`.
///
/// Membership is per column: a value counts as known if the system report
/// contains it anywhere in that column. A column the system report does not
/// have at all makes every value in it unknown, so rows carrying one are
/// always flagged. Row indices in the result are 1-based and exclude the
/// header.
pub fn diff_against_system(
    extracted_csv: &Path,
    system_csv: &Path,
) -> Result<Vec<RowDifference>, StageError> {
    let read_err = |path: &Path| {
        let path = path.display().to_string();
        move |e: csv::Error| StageError::ComparisonFailed {
            detail: format!("{path}: {e}"),
        }
    };

    let mut system = csv::Reader::from_path(system_csv).map_err(read_err(system_csv))?;
    let headers = system
        .headers()
        .map_err(read_err(system_csv))?
        .clone();
    let mut known: Vec<HashSet<String>> = vec![HashSet::new(); headers.len()];
    for record in system.records() {
        let record = record.map_err(read_err(system_csv))?;
        for (i, value) in record.iter().enumerate().take(known.len()) {
            known[i].insert(value.to_string());
        }
    }

    let mut extracted = csv::Reader::from_path(extracted_csv).map_err(read_err(extracted_csv))?;
    let extracted_headers = extracted
        .headers()
        .map_err(read_err(extracted_csv))?
        .clone();
    // Map extracted columns onto system columns by header name.
    let column_map: Vec<Option<usize>> = extracted_headers
        .iter()
        .map(|h| headers.iter().position(|s| s == h))
        .collect();

    let mut differences = Vec::new();
    for (row_idx, record) in extracted.records().enumerate() {
        let record = record.map_err(read_err(extracted_csv))?;
        let unknown = record.iter().enumerate().any(|(i, value)| {
            match column_map.get(i).copied().flatten() {
                Some(col) => !known[col].contains(value),
                None => true,
            }
        });
        if unknown {
            differences.push(RowDifference {
                row: row_idx + 1,
                values: record.iter().map(|s| s.to_string()).collect(),
            });
        }
    }
    Ok(differences)
}
