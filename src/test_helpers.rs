//! Shared test utilities.
//!
//! Builders for decoded images and Exif blobs, plus readers that inspect what
//! a conversion left on disk.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let backend = MockBackend::new()
//!     .with_image("a.heic", solid_image(32, 24, Some(heif_exif_blob(6))));
//! // ... run a batch ...
//! assert_eq!(read_orientation(&out.join("a.jpg")), Some(6));
//! assert_eq!(output_names(&out), vec!["a.jpg"]);
//! ```

use crate::imaging::DecodedImage;
use exif::experimental::Writer;
use exif::{Exif, Field, In, Reader, Tag, Value};
use std::io::{BufReader, Cursor};
use std::path::Path;

// =========================================================================
// Image builders
// =========================================================================

/// A uniformly grey RGB8 image, as a decoder would hand it back.
pub fn solid_image(width: u32, height: u32, exif: Option<Vec<u8>>) -> DecodedImage {
    DecodedImage {
        width,
        height,
        pixels: vec![128; (width * height * 3) as usize],
        exif,
    }
}

/// Write a small JPEG without any Exif segment.
pub fn create_test_jpeg(path: &Path, width: u32, height: u32) {
    image::RgbImage::from_pixel(width, height, image::Rgb([40, 90, 160]))
        .save(path)
        .unwrap();
}

// =========================================================================
// Exif builders
// =========================================================================

/// Serialize fields into a bare TIFF structure.
pub fn tiff_with_fields(fields: &[Field], little_endian: bool) -> Vec<u8> {
    let mut writer = Writer::new();
    for field in fields {
        writer.push_field(field);
    }
    let mut buf = Cursor::new(Vec::new());
    writer.write(&mut buf, little_endian).unwrap();
    buf.into_inner()
}

/// An Exif item as stored in a HEIC container: big-endian offset, `Exif\0\0`
/// prefix, then big-endian TIFF with an orientation and camera make.
pub fn heif_exif_blob(orientation: u16) -> Vec<u8> {
    let tiff = tiff_with_fields(
        &[
            Field {
                tag: Tag::Orientation,
                ifd_num: In::PRIMARY,
                value: Value::Short(vec![orientation]),
            },
            Field {
                tag: Tag::Make,
                ifd_num: In::PRIMARY,
                value: Value::Ascii(vec![b"Apple".to_vec()]),
            },
        ],
        false,
    );
    let mut blob = 6u32.to_be_bytes().to_vec();
    blob.extend_from_slice(b"Exif\0\0");
    blob.extend_from_slice(&tiff);
    blob
}

// =========================================================================
// Output inspection
// =========================================================================

/// Parse the Exif segment of a JPEG on disk, `None` if it has none.
pub fn read_jpeg_exif(path: &Path) -> Option<Exif> {
    let file = std::fs::File::open(path).unwrap();
    Reader::new()
        .read_from_container(&mut BufReader::new(file))
        .ok()
}

/// Orientation tag of a JPEG on disk.
pub fn read_orientation(path: &Path) -> Option<u32> {
    read_jpeg_exif(path)?
        .get_field(Tag::Orientation, In::PRIMARY)?
        .value
        .get_uint(0)
}

/// Sorted file names in a directory.
pub fn output_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
