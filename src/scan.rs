//! Input enumeration and output directory preparation.
//!
//! The input is one flat directory. Every immediate entry becomes a
//! [`WorkItem`], subdirectories included (they are skipped later, when
//! processed). Nothing below the top level is visited.
//!
//! Both functions here run before any work is dispatched; their errors are
//! fatal for the whole batch.

use crate::types::WorkItem;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Input directory not found: {0}")]
    DirectoryNotFound(PathBuf),
    #[error("Cannot read input directory {path}: {source}")]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Cannot create output directory {path}: {source}")]
    OutputDirectoryCreate {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Output directory {0} is the input directory")]
    OutputIsInput(PathBuf),
}

/// List the immediate entries of `input_dir`, sorted by path.
pub fn list_entries(input_dir: &Path) -> Result<Vec<PathBuf>, ScanError> {
    if !input_dir.is_dir() {
        return Err(ScanError::DirectoryNotFound(input_dir.to_path_buf()));
    }

    let unreadable = |source| ScanError::Unreadable {
        path: input_dir.to_path_buf(),
        source,
    };

    let mut entries = fs::read_dir(input_dir)
        .map_err(unreadable)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(unreadable)?;

    entries.sort();
    Ok(entries)
}

/// Enumerate `input_dir` into work items that write to `output_dir`.
pub fn scan<'a>(input_dir: &Path, output_dir: &'a Path) -> Result<Vec<WorkItem<'a>>, ScanError> {
    Ok(list_entries(input_dir)?
        .into_iter()
        .map(|source| WorkItem { source, output_dir })
        .collect())
}

/// Create `output_dir` (and parents) if missing.
///
/// Refuses an output directory that resolves to the input directory: copies
/// would be written over their own sources.
pub fn prepare_output_dir(input_dir: &Path, output_dir: &Path) -> Result<(), ScanError> {
    let create_failed = |source| ScanError::OutputDirectoryCreate {
        path: output_dir.to_path_buf(),
        source,
    };

    fs::create_dir_all(output_dir).map_err(create_failed)?;

    let output = output_dir.canonicalize().map_err(create_failed)?;
    let input = input_dir
        .canonicalize()
        .map_err(|source| ScanError::Unreadable {
            path: input_dir.to_path_buf(),
            source,
        })?;
    if input == output {
        return Err(ScanError::OutputIsInput(output_dir.to_path_buf()));
    }
    Ok(())
}
