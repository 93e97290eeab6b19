//! Production codec backend.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode HEIC (primary image → RGB8) | `libheif-rs` (`heif` cargo feature) |
//! | Read embedded Exif block | `libheif-rs` metadata blocks |
//! | Encode JPEG | `image::codecs::jpeg::JpegEncoder` |
//!
//! HEIC decoding needs the system libheif, so it sits behind the `heif`
//! feature. A build without it still copies media and reports every HEIC file
//! as a per-file failure with a message pointing at the feature.

use super::backend::{BackendError, DecodedImage, ImageBackend};
use super::params::EncodeParams;
use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder};
use std::io::Write;
use std::path::Path;

/// libheif decoder + `image` crate JPEG encoder.
pub struct HeifBackend;

impl HeifBackend {
    pub fn new() -> Self {
        Self
    }

    /// Whether HEIC decoding was compiled into this binary.
    pub fn heic_supported() -> bool {
        cfg!(feature = "heif")
    }
}

impl Default for HeifBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "heif")]
fn decode(path: &Path) -> Result<DecodedImage, BackendError> {
    use libheif_rs::{ColorSpace, HeifContext, HeifError, ItemId, LibHeif, RgbChroma};

    let failed = |stage: &str, e: HeifError| {
        BackendError::ProcessingFailed(format!("Failed to {stage} {}: {e}", path.display()))
    };

    let path_str = path.to_str().ok_or_else(|| {
        BackendError::ProcessingFailed(format!("Path is not valid UTF-8: {}", path.display()))
    })?;
    let ctx = HeifContext::read_from_file(path_str).map_err(|e| failed("read", e))?;
    let handle = ctx
        .primary_image_handle()
        .map_err(|e| failed("open primary image of", e))?;

    let lib_heif = LibHeif::new();
    let image = lib_heif
        .decode(&handle, ColorSpace::Rgb(RgbChroma::Rgb), None)
        .map_err(|e| failed("decode", e))?;

    let planes = image.planes();
    let plane = planes.interleaved.ok_or_else(|| {
        BackendError::ProcessingFailed(format!("No interleaved RGB plane in {}", path.display()))
    })?;

    // libheif pads rows to `stride`; JPEG encoding wants them packed.
    let row_len = plane.width as usize * 3;
    let mut pixels = Vec::with_capacity(row_len * plane.height as usize);
    for row in plane.data.chunks(plane.stride).take(plane.height as usize) {
        let packed = row.get(..row_len).ok_or_else(|| {
            BackendError::ProcessingFailed(format!("Truncated pixel row in {}", path.display()))
        })?;
        pixels.extend_from_slice(packed);
    }

    let exif_ids: Vec<ItemId> = handle.metadata_block_ids(b"Exif");
    let exif = exif_ids
        .first()
        .map(|&id| handle.metadata(id))
        .transpose()
        .map_err(|e| failed("read Exif block of", e))?;

    Ok(DecodedImage {
        width: plane.width,
        height: plane.height,
        pixels,
        exif,
    })
}

#[cfg(not(feature = "heif"))]
fn decode(path: &Path) -> Result<DecodedImage, BackendError> {
    // Surface a missing file as an IO error even without a decoder.
    std::fs::metadata(path)?;
    Err(BackendError::Unavailable(
        "HEIC decoding not available - rebuild with `--features heif`",
    ))
}

/// Encode packed RGB8 pixels as a baseline JPEG.
pub(crate) fn write_jpeg(image: &DecodedImage, params: &EncodeParams) -> Result<(), BackendError> {
    let expected = image.width as usize * image.height as usize * 3;
    if image.pixels.len() != expected {
        return Err(BackendError::ProcessingFailed(format!(
            "Pixel buffer holds {} bytes, expected {} for {}x{} RGB",
            image.pixels.len(),
            expected,
            image.width,
            image.height
        )));
    }

    let file = std::fs::File::create(&params.output)?;
    let mut writer = std::io::BufWriter::new(file);
    JpegEncoder::new_with_quality(&mut writer, params.quality.value() as u8)
        .write_image(
            &image.pixels,
            image.width,
            image.height,
            ExtendedColorType::Rgb8,
        )
        .map_err(|e| BackendError::ProcessingFailed(format!("JPEG encode failed: {}", e)))?;
    writer.flush()?;
    Ok(())
}

impl ImageBackend for HeifBackend {
    fn decode_heic(&self, path: &Path) -> Result<DecodedImage, BackendError> {
        decode(path)
    }

    fn encode_jpeg(
        &self,
        image: &DecodedImage,
        params: &EncodeParams,
    ) -> Result<(), BackendError> {
        write_jpeg(image, params)
    }
}
