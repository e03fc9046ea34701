//! Shared PDF text access.
//!
//! Thin wrapper over [`pdf_extract`]. Malformed PDFs can make the parser
//! panic instead of returning `Err`, and a corrupt scan in the inbox must
//! not take the whole batch down, so every call crosses a
//! [`std::panic::catch_unwind`] boundary and comes back as a
//! [`StageError`].

use crate::error::StageError;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

/// Extract the text of every page, one `String` per page (empty when the
/// page yields nothing).
///
/// Panics from the underlying library are caught and converted to errors.
pub fn extract_pages(pdf_path: &Path) -> Result<Vec<String>, StageError> {
    let data = std::fs::read(pdf_path).map_err(|e| StageError::ProbeFailed {
        detail: format!("{}: {e}", pdf_path.display()),
    })?;
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(&data)
    }));
    match result {
        Ok(Ok(pages)) => Ok(pages),
        Ok(Err(e)) => Err(StageError::ProbeFailed {
            detail: format!("{}: {e}", pdf_path.display()),
        }),
        Err(_) => Err(StageError::ProbeFailed {
            detail: format!("{}: extraction panicked (malformed document)", pdf_path.display()),
        }),
    }
}

/// Open the PDF and count its pages.
///
/// This is the validity probe: any parse failure means the file cannot be
/// trusted for extraction.
pub fn page_count(pdf_path: &Path) -> Result<usize, StageError> {
    extract_pages(pdf_path).map(|pages| pages.len())
}
