//! Exif carry-over from a HEIC container into a freshly written JPEG.
//!
//! HEIC stores Exif as a metadata item: a big-endian u32 offset, that many
//! bytes of prefix (usually `Exif\0\0`), then the TIFF structure. JPEG wants
//! the TIFF structure inside an `APP1` segment.
//!
//! The blob is parsed with `kamadak-exif` and written back out with its
//! writer rather than copied verbatim, so a structurally broken block is
//! reported instead of being planted in the output.

use super::jpeg::{EXIF_HEADER, with_exif_segment};
use exif::experimental::Writer;
use exif::{Exif, In, Reader, Tag};
use std::io::Cursor;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExifError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Exif block has no TIFF header")]
    MissingTiffHeader,
    #[error("Invalid Exif block: {0}")]
    Parse(#[source] exif::Error),
    #[error("Exif re-serialization failed: {0}")]
    Serialize(#[source] exif::Error),
    #[error("Output is not a JPEG file")]
    NotJpeg,
    #[error("Malformed JPEG segment at offset {0}")]
    MalformedJpeg(usize),
    #[error("Exif block of {0} bytes does not fit in a JPEG APP1 segment")]
    TooLarge(usize),
}

fn is_tiff_header(data: &[u8]) -> bool {
    data.starts_with(b"II*\0") || data.starts_with(b"MM\0*")
}

/// Locate the TIFF structure inside an Exif blob.
///
/// Accepts the HEIF item layout (u32 offset prefix), a JPEG-style
/// `Exif\0\0` prefix, or bare TIFF.
pub fn tiff_payload(blob: &[u8]) -> Result<&[u8], ExifError> {
    if is_tiff_header(blob) {
        return Ok(blob);
    }
    if let Some(rest) = blob.strip_prefix(EXIF_HEADER).filter(|r| is_tiff_header(r)) {
        return Ok(rest);
    }
    blob.get(..4)
        .map(|offset| u32::from_be_bytes([offset[0], offset[1], offset[2], offset[3]]) as usize)
        .and_then(|skip| blob.get(4usize.saturating_add(skip)..))
        .filter(|rest| is_tiff_header(rest))
        .ok_or(ExifError::MissingTiffHeader)
}

/// Parse an Exif blob into structured fields.
pub fn parse(blob: &[u8]) -> Result<Exif, ExifError> {
    let tiff = tiff_payload(blob)?;
    Reader::new()
        .read_raw(tiff.to_vec())
        .map_err(ExifError::Parse)
}

/// Embedded thumbnail JPEG referenced from IFD1, if any.
fn thumbnail(exif: &Exif) -> Option<&[u8]> {
    let offset = exif
        .get_field(Tag::JPEGInterchangeFormat, In::THUMBNAIL)?
        .value
        .get_uint(0)? as usize;
    let len = exif
        .get_field(Tag::JPEGInterchangeFormatLength, In::THUMBNAIL)?
        .value
        .get_uint(0)? as usize;
    exif.buf().get(offset..offset.checked_add(len)?)
}

/// Serialize parsed Exif back to a TIFF structure, keeping the byte order.
pub fn serialize(exif: &Exif) -> Result<Vec<u8>, ExifError> {
    let mut writer = Writer::new();
    for field in exif
        .fields()
        .filter(|f| f.ifd_num == In::PRIMARY || f.ifd_num == In::THUMBNAIL)
    {
        writer.push_field(field);
    }
    if let Some(jpeg) = thumbnail(exif) {
        writer.set_jpeg(jpeg, In::THUMBNAIL);
    }

    let mut buf = Cursor::new(Vec::new());
    writer
        .write(&mut buf, exif.little_endian())
        .map_err(ExifError::Serialize)?;
    Ok(buf.into_inner())
}

/// Parse `blob`, re-serialize it, and write it into the JPEG at `jpeg_path`,
/// replacing any Exif segment already there.
///
/// The JPEG is only rewritten once the new bytes are fully assembled, so on
/// error the file on disk is the untouched encoder output.
pub fn carry_over(blob: &[u8], jpeg_path: &Path) -> Result<(), ExifError> {
    let exif = parse(blob)?;
    let tiff = serialize(&exif)?;
    let jpeg = std::fs::read(jpeg_path)?;
    let updated = with_exif_segment(&jpeg, &tiff)?;
    std::fs::write(jpeg_path, updated)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{
        create_test_jpeg, heif_exif_blob, read_jpeg_exif, read_orientation, tiff_with_fields,
    };
    use exif::{Field, Value};

    #[test]
    fn tiff_payload_bare_tiff() {
        let tiff = b"MM\0*rest";
        assert_eq!(tiff_payload(tiff).unwrap(), tiff);
    }

    #[test]
    fn tiff_payload_exif_prefix() {
        let blob = b"Exif\0\0II*\0rest";
        assert_eq!(tiff_payload(blob).unwrap(), b"II*\0rest");
    }

    #[test]
    fn tiff_payload_heif_offset_layout() {
        let mut blob = 6u32.to_be_bytes().to_vec();
        blob.extend_from_slice(b"Exif\0\0MM\0*rest");
        assert_eq!(tiff_payload(&blob).unwrap(), b"MM\0*rest");

        let mut zero_offset = 0u32.to_be_bytes().to_vec();
        zero_offset.extend_from_slice(b"II*\0rest");
        assert_eq!(tiff_payload(&zero_offset).unwrap(), b"II*\0rest");
    }

    #[test]
    fn tiff_payload_rejects_garbage() {
        assert!(matches!(
            tiff_payload(b"garbage"),
            Err(ExifError::MissingTiffHeader)
        ));
        assert!(matches!(tiff_payload(b""), Err(ExifError::MissingTiffHeader)));
        // Offset pointing past the end
        let blob = [0xFF, 0xFF, 0xFF, 0xFF, b'M', b'M'];
        assert!(matches!(
            tiff_payload(&blob),
            Err(ExifError::MissingTiffHeader)
        ));
    }

    #[test]
    fn parse_reads_orientation() {
        let exif = parse(&heif_exif_blob(6)).unwrap();
        let orientation = exif
            .get_field(Tag::Orientation, In::PRIMARY)
            .and_then(|f| f.value.get_uint(0));
        assert_eq!(orientation, Some(6));
    }

    #[test]
    fn parse_truncated_tiff_is_error() {
        let result = parse(b"MM\0*\0\0");
        assert!(matches!(result, Err(ExifError::Parse(_))));
    }

    #[test]
    fn serialize_round_trips_fields() {
        let tiff = tiff_with_fields(
            &[
                Field {
                    tag: Tag::Orientation,
                    ifd_num: In::PRIMARY,
                    value: Value::Short(vec![3]),
                },
                Field {
                    tag: Tag::Make,
                    ifd_num: In::PRIMARY,
                    value: Value::Ascii(vec![b"Apple".to_vec()]),
                },
                Field {
                    tag: Tag::DateTimeOriginal,
                    ifd_num: In::PRIMARY,
                    value: Value::Ascii(vec![b"2023:06:01 10:20:30".to_vec()]),
                },
            ],
            true,
        );
        let original = parse(&tiff).unwrap();
        let rewritten = parse(&serialize(&original).unwrap()).unwrap();

        assert!(rewritten.little_endian());
        for tag in [Tag::Orientation, Tag::Make, Tag::DateTimeOriginal] {
            let before = original.get_field(tag, In::PRIMARY).unwrap();
            let after = rewritten.get_field(tag, In::PRIMARY).unwrap();
            assert_eq!(
                before.display_value().to_string(),
                after.display_value().to_string(),
                "{tag} changed across re-serialization"
            );
        }
    }

    #[test]
    fn serialize_keeps_thumbnail_and_gps() {
        let thumb = [0xFF, 0xD8, 1, 2, 3, 4, 0xFF, 0xD9];
        let orientation = Field {
            tag: Tag::Orientation,
            ifd_num: In::PRIMARY,
            value: Value::Short(vec![6]),
        };
        let latitude = Field {
            tag: Tag::GPSLatitude,
            ifd_num: In::PRIMARY,
            value: Value::Rational(vec![(52, 1).into(), (31, 1).into(), (1234, 100).into()]),
        };
        let latitude_ref = Field {
            tag: Tag::GPSLatitudeRef,
            ifd_num: In::PRIMARY,
            value: Value::Ascii(vec![b"N".to_vec()]),
        };
        let mut writer = Writer::new();
        writer.push_field(&orientation);
        writer.push_field(&latitude);
        writer.push_field(&latitude_ref);
        writer.set_jpeg(&thumb, In::THUMBNAIL);
        let mut buf = Cursor::new(Vec::new());
        writer.write(&mut buf, false).unwrap();

        let original = parse(&buf.into_inner()).unwrap();
        let rewritten = parse(&serialize(&original).unwrap()).unwrap();

        assert_eq!(thumbnail(&original), Some(&thumb[..]));
        assert_eq!(thumbnail(&rewritten), Some(&thumb[..]));
        for tag in [Tag::GPSLatitude, Tag::GPSLatitudeRef, Tag::Orientation] {
            assert_eq!(
                original
                    .get_field(tag, In::PRIMARY)
                    .unwrap()
                    .display_value()
                    .to_string(),
                rewritten
                    .get_field(tag, In::PRIMARY)
                    .unwrap()
                    .display_value()
                    .to_string(),
                "{tag} changed across re-serialization"
            );
        }
    }

    #[test]
    fn carry_over_writes_exif_into_jpeg() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("a.jpg");
        create_test_jpeg(&path, 32, 24);

        carry_over(&heif_exif_blob(6), &path).unwrap();

        assert_eq!(read_orientation(&path), Some(6));
        // Still a decodable image
        assert_eq!(image::image_dimensions(&path).unwrap(), (32, 24));
    }

    #[test]
    fn carry_over_bad_blob_leaves_jpeg_untouched() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("a.jpg");
        create_test_jpeg(&path, 16, 16);
        let before = std::fs::read(&path).unwrap();

        let result = carry_over(b"not exif at all", &path);

        assert!(matches!(result, Err(ExifError::MissingTiffHeader)));
        assert_eq!(std::fs::read(&path).unwrap(), before);
        assert!(read_jpeg_exif(&path).is_none());
    }
}
