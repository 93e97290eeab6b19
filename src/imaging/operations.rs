//! High-level file operations.
//!
//! These functions combine the codec backend with Exif carry-over and
//! filesystem work. Each one produces exactly one output file on success.

use super::backend::{BackendError, DecodedImage, ImageBackend};
use super::exif_io::{self, ExifError};
use super::params::{EncodeParams, Quality};
use crate::types::ExifStatus;
use filetime::FileTime;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TranscodeError {
    #[error("{0}")]
    Codec(#[from] BackendError),
    #[error("{0}")]
    Metadata(#[from] ExifError),
}

/// Settings for one HEIC → JPEG transcode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TranscodeOptions {
    pub quality: Quality,
    pub preserve_exif: bool,
}

impl Default for TranscodeOptions {
    fn default() -> Self {
        Self {
            quality: Quality::default(),
            preserve_exif: true,
        }
    }
}

/// Hidden sibling of `output` that the encoder writes to first.
fn partial_path(output: &Path) -> PathBuf {
    let name = output
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    output.with_file_name(format!(".{name}.partial"))
}

/// Encode into a hidden partial file, then rename it onto `output`.
///
/// On failure only the partial file is removed; whatever already sits at
/// `output` is left alone.
fn encode_atomically(
    backend: &impl ImageBackend,
    decoded: &DecodedImage,
    output: &Path,
    quality: Quality,
) -> Result<(), BackendError> {
    let params = EncodeParams {
        output: partial_path(output),
        quality,
    };
    let result = backend
        .encode_jpeg(decoded, &params)
        .and_then(|()| std::fs::rename(&params.output, output).map_err(BackendError::from));
    if result.is_err() {
        let _ = std::fs::remove_file(&params.output);
    }
    result
}

/// Decode `source`, write it as JPEG to `output`, then carry its Exif over.
///
/// A decode or encode failure writes nothing at `output`, and an existing
/// file there survives. A metadata failure happens after the JPEG is in
/// place and leaves it there without Exif.
pub fn transcode_heic(
    backend: &impl ImageBackend,
    source: &Path,
    output: &Path,
    options: &TranscodeOptions,
) -> Result<ExifStatus, TranscodeError> {
    let decoded = backend.decode_heic(source)?;
    encode_atomically(backend, &decoded, output, options.quality)?;

    match decoded.exif.as_deref() {
        None => Ok(ExifStatus::Absent),
        Some(_) if !options.preserve_exif => Ok(ExifStatus::Stripped),
        Some(blob) => {
            exif_io::carry_over(blob, output)?;
            Ok(ExifStatus::Preserved)
        }
    }
}

/// Copy a file and carry its access/modification times over.
///
/// `fs::copy` already copies permission bits; timestamps are applied after.
pub fn copy_with_metadata(source: &Path, output: &Path) -> std::io::Result<()> {
    std::fs::copy(source, output)?;
    let metadata = std::fs::metadata(source)?;
    filetime::set_file_times(
        output,
        FileTime::from_last_access_time(&metadata),
        FileTime::from_last_modification_time(&metadata),
    )
}
