//! Extraction: searchable PDF → per-page CSV.
//!
//! One data row per page, `(pagina, texto)`, 1-based and strictly in page
//! order; pages without text get an empty `texto` field rather than being
//! skipped, so row N is always page N. The raw extracted text goes into the
//! CSV untouched — normalization is a concern of the probes, not of the
//! artifact downstream systems import.

use crate::error::StageError;
use crate::pipeline::pdftext;
use std::path::Path;
use tracing::info;

/// The fixed two-column CSV header.
pub const CSV_HEADER: [&str; 2] = ["pagina", "texto"];

/// Extract every page of `pdf_path` into a CSV at `csv_path`.
///
/// Returns the number of data rows written. The CSV may be left partially
/// written when an I/O error hits mid-file; callers treat any `Err` as
/// "artifact unusable" and the existence-gated re-run will not retry while
/// the partial file is present.
pub fn extract_to_csv(pdf_path: &Path, csv_path: &Path) -> Result<usize, StageError> {
    let pages = pdftext::extract_pages(pdf_path).map_err(|e| StageError::ExtractionFailed {
        detail: e.to_string(),
    })?;

    let file = std::fs::File::create(csv_path).map_err(|e| StageError::ExtractionFailed {
        detail: format!("{}: {e}", csv_path.display()),
    })?;
    write_page_rows(&pages, file)?;

    info!("Extracted {} pages to {}", pages.len(), csv_path.display());
    Ok(pages.len())
}

/// Write the header and one row per page to `writer`.
///
/// Split out from the I/O wrapper so the row shape is testable without a
/// real PDF.
pub fn write_page_rows<W: std::io::Write>(pages: &[String], writer: W) -> Result<(), StageError> {
    let mut w = csv::Writer::from_writer(writer);
    let io_err = |e: csv::Error| StageError::ExtractionFailed { detail: e.to_string() };

    w.write_record(CSV_HEADER).map_err(io_err)?;
    for (i, text) in pages.iter().enumerate() {
        w.write_record([(i + 1).to_string().as_str(), text.as_str()])
            .map_err(io_err)?;
    }
    w.flush().map_err(|e| StageError::ExtractionFailed {
        detail: e.to_string(),
    })?;
    Ok(())
}
