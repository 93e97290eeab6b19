//! Shared types used by the scan, process and output modules.
//!
//! `SkipReason` and `ExifStatus` also appear in the JSON batch report, so
//! their serialized names are part of the report format.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// One directory entry to process.
///
/// Created by [`scan`](crate::scan::scan), consumed exactly once by
/// [`process_file`](crate::process::process_file). The output directory is
/// shared by every item of a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkItem<'a> {
    pub source: PathBuf,
    pub output_dir: &'a Path,
}

impl WorkItem<'_> {
    /// File name of the source, lossily converted for display.
    pub fn file_name(&self) -> String {
        self.source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.source.to_string_lossy().into_owned())
    }
}

/// Why an entry produced no output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Extension is not one of the transcoded or copied types.
    UnsupportedExtension,
    /// Entry is a directory or other non-regular file.
    NotAFile,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::UnsupportedExtension => write!(f, "unsupported extension"),
            SkipReason::NotAFile => write!(f, "not a regular file"),
        }
    }
}

/// What happened to the source's Exif block during a transcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExifStatus {
    /// Carried into the JPEG.
    Preserved,
    /// The source had none.
    Absent,
    /// The source had one but preservation was turned off.
    Stripped,
}
