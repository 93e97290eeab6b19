//! Image codec backend trait and shared types.
//!
//! The [`ImageBackend`] trait covers the two codec operations the converter
//! needs: decoding a HEIC container and encoding pixels as JPEG. EXIF handling
//! is not part of the backend; the decoder only hands back the raw blob.
//!
//! The production implementation is
//! [`HeifBackend`](super::heif_backend::HeifBackend). Tests use the
//! recording `MockBackend` in this module.

use super::params::EncodeParams;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
    #[error("{0}")]
    Unavailable(&'static str),
}

/// A decoded HEIC primary image.
///
/// `pixels` is tightly packed RGB8, `width * height * 3` bytes. `exif` is the
/// raw Exif metadata block as stored in the container, if there was one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
    pub exif: Option<Vec<u8>>,
}

/// Trait for codec backends.
///
/// Must be `Sync`: one backend instance is shared by every rayon worker.
pub trait ImageBackend: Sync {
    /// Decode the primary image of a HEIC file.
    fn decode_heic(&self, path: &Path) -> Result<DecodedImage, BackendError>;

    /// Encode decoded pixels as a JPEG file at `params.output`.
    fn encode_jpeg(&self, image: &DecodedImage, params: &EncodeParams)
    -> Result<(), BackendError>;
}
