//! Codec and metadata plumbing for one file at a time.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode HEIC** | `libheif-rs` (feature `heif`) |
//! | **Encode JPEG** | `image::codecs::jpeg::JpegEncoder` |
//! | **Exif parse / re-serialize** | `kamadak-exif` |
//! | **Exif insert** | JPEG APP1 segment splicing |
//! | **Copy with timestamps** | `std::fs::copy` + `filetime` |
//!
//! The module is split into:
//! - **Parameters**: data describing an encode
//! - **Backend**: [`ImageBackend`] trait + [`HeifBackend`]
//! - **Exif / JPEG**: metadata carry-over, independent of the backend
//! - **Operations**: transcode and copy, combining the above

pub mod backend;
pub mod exif_io;
pub mod heif_backend;
mod jpeg;
pub mod operations;
mod params;

pub use backend::{BackendError, DecodedImage, ImageBackend};
pub use exif_io::ExifError;
pub use heif_backend::HeifBackend;
pub use operations::{TranscodeError, TranscodeOptions, copy_with_metadata, transcode_heic};
pub use params::{EncodeParams, Quality};
