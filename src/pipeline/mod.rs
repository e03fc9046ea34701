//! Pipeline stages for invoice OCR and extraction.
//!
//! Each submodule implements exactly one transformation step. Keeping stages
//! separate makes each independently testable and keeps the skip/continue
//! decisions in one place (the orchestrator in [`crate::run`]).
//!
//! ## Data Flow
//!
//! ```text
//! discover ──▶ ocr ──▶ probe ──▶ extract ──▶ compare
//! (inbox scan) (ocrmypdf) (validity)  (CSV)     (heuristics)
//! ```
//!
//! 1. [`discover`] — list qualifying `NF*.pdf` files from the inbox, capped
//!    to the batch limit
//! 2. [`ocr`]      — run the OCR engine as a subprocess; the only stage that
//!    spawns processes
//! 3. [`probe`]    — truncation marker scan, parse check, searchability
//! 4. [`extract`]  — one CSV row per page of the converted PDF
//! 5. [`compare`]  — prefix-containment against the CSV and column-set diff
//!    against the system report
//!
//! [`pdftext`] and [`normalize`] are shared helpers used by the probe,
//! extraction, and comparison stages.

pub mod compare;
pub mod discover;
pub mod extract;
pub mod normalize;
pub mod ocr;
pub mod pdftext;
pub mod probe;
