//! Input discovery: which files does this run process?
//!
//! A file qualifies when its name starts with the configured prefix and ends
//! in `.pdf`, both case-insensitive. Discovery takes the first
//! `batch_limit` qualifying entries in directory listing order; it does not
//! sort, so the cap is deterministic per filesystem but not lexicographic.

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use std::path::PathBuf;
use tracing::{debug, warn};

/// One qualifying input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Bare filename, reused to name every derived artifact.
    pub filename: String,
    /// Full path under the input directory.
    pub path: PathBuf,
}

/// List up to `batch_limit` qualifying PDFs in the input directory.
///
/// Entries that are not regular files, or whose names are not valid UTF-8,
/// are skipped with a warning. A missing input directory is fatal.
pub fn list_candidates(config: &PipelineConfig) -> Result<Vec<Candidate>, PipelineError> {
    if !config.input_dir.is_dir() {
        return Err(PipelineError::InputDirNotFound {
            path: config.input_dir.clone(),
        });
    }

    let entries = std::fs::read_dir(&config.input_dir).map_err(|e| {
        PipelineError::InputDirUnreadable {
            path: config.input_dir.clone(),
            source: e,
        }
    })?;

    let prefix = config.filename_prefix.to_lowercase();
    let mut candidates = Vec::new();
    for entry in entries {
        if candidates.len() >= config.batch_limit {
            break;
        }
        let entry = entry.map_err(|e| PipelineError::InputDirUnreadable {
            path: config.input_dir.clone(),
            source: e,
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let filename = match entry.file_name().into_string() {
            Ok(name) => name,
            Err(raw) => {
                warn!("Skipping non-UTF-8 filename: {raw:?}");
                continue;
            }
        };
        let lower = filename.to_lowercase();
        if lower.starts_with(&prefix) && lower.ends_with(".pdf") {
            debug!("qualifies: {filename}");
            candidates.push(Candidate { filename, path });
        }
    }
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::io::Write;

    fn touch(dir: &std::path::Path, name: &str) {
        let mut f = std::fs::File::create(dir.join(name)).unwrap();
        f.write_all(b"x").unwrap();
    }

    fn config_for(input: &std::path::Path) -> PipelineConfig {
        PipelineConfig::builder()
            .input_dir(input)
            .converted_dir(input.join("out"))
            .build()
            .unwrap()
    }

    #[test]
    fn filter_is_prefix_and_extension_case_insensitive() {
        let tmp = tempfile::tempdir().unwrap();
        for name in ["NF1.pdf", "nf2.PDF", "invoice.pdf", "NF3.txt", "NF4.pdf.bak"] {
            touch(tmp.path(), name);
        }
        let found: HashSet<String> = list_candidates(&config_for(tmp.path()))
            .unwrap()
            .into_iter()
            .map(|c| c.filename)
            .collect();
        let expected: HashSet<String> =
            ["NF1.pdf", "nf2.PDF"].iter().map(|s| s.to_string()).collect();
        assert_eq!(found, expected);
    }

    #[test]
    fn batch_limit_caps_results() {
        let tmp = tempfile::tempdir().unwrap();
        for i in 0..15 {
            touch(tmp.path(), &format!("NF{i}.pdf"));
        }
        let config = PipelineConfig::builder()
            .input_dir(tmp.path())
            .converted_dir(tmp.path().join("out"))
            .batch_limit(10)
            .build()
            .unwrap();
        assert_eq!(list_candidates(&config).unwrap().len(), 10);
    }

    #[test]
    fn directories_are_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir(tmp.path().join("NFdir.pdf")).unwrap();
        touch(tmp.path(), "NF1.pdf");
        let found = list_candidates(&config_for(tmp.path())).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].filename, "NF1.pdf");
    }

    #[test]
    fn missing_input_dir_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let err = list_candidates(&config_for(&tmp.path().join("absent"))).unwrap_err();
        assert!(matches!(err, PipelineError::InputDirNotFound { .. }));
    }

    #[test]
    fn empty_dir_yields_no_candidates() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(list_candidates(&config_for(tmp.path())).unwrap().is_empty());
    }

    #[test]
    fn custom_prefix_is_honored() {
        let tmp = tempfile::tempdir().unwrap();
        touch(tmp.path(), "FAT1.pdf");
        touch(tmp.path(), "NF1.pdf");
        let config = PipelineConfig::builder()
            .input_dir(tmp.path())
            .converted_dir(tmp.path().join("out"))
            .filename_prefix("FAT")
            .build()
            .unwrap();
        let found = list_candidates(&config).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].filename, "FAT1.pdf");
    }
}
