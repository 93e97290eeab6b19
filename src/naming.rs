//! Extension-based classification and output file naming.
//!
//! Every entry in the input directory is routed by its lowercased extension:
//!
//! | Extension | Action | Output name |
//! |---|---|---|
//! | `.heic` | transcode | same stem, `.jpg` |
//! | `.jpg` `.png` `.mp4` `.mp3` | copy | unchanged |
//! | anything else, or none | skip | none |
//!
//! Only the final extension counts: `IMG_0001.HEIC` → `IMG_0001.jpg`,
//! `notes.heic.txt` is skipped, and `.jpeg` is not treated as `.jpg`.

use std::path::{Path, PathBuf};

/// Extension of files decoded and re-encoded as JPEG.
pub const TRANSCODE_EXTENSION: &str = "heic";

/// Extensions of files copied through unchanged.
pub const COPY_EXTENSIONS: &[&str] = &["jpg", "mp4", "mp3", "png"];

/// What to do with a recognized file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Transcode,
    Copy,
}

/// A classified entry: the action and the file name it produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Planned {
    pub action: Action,
    pub output_name: PathBuf,
}

/// Lowercased final extension, if it is valid UTF-8.
fn extension(file_name: &Path) -> Option<String> {
    file_name
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// Classify a file name by extension. `None` means skip.
pub fn classify(file_name: &Path) -> Option<Action> {
    let ext = extension(file_name)?;
    if ext == TRANSCODE_EXTENSION {
        Some(Action::Transcode)
    } else if COPY_EXTENSIONS.contains(&ext.as_str()) {
        Some(Action::Copy)
    } else {
        None
    }
}

/// Classify a file name and compute its output name.
///
/// Distinct input names map to distinct output names, except when a
/// directory holds both `x.heic` and `x.jpg`: both produce `x.jpg`.
pub fn plan(file_name: &Path) -> Option<Planned> {
    let action = classify(file_name)?;
    let output_name = match action {
        Action::Transcode => file_name.with_extension("jpg"),
        Action::Copy => file_name.to_path_buf(),
    };
    Some(Planned {
        action,
        output_name,
    })
}
