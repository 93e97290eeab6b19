//! JPEG marker-segment splicing for Exif insertion.
//!
//! A JPEG file is `SOI`, a run of marker segments (`FF xx` + big-endian u16
//! length that counts itself), then `SOS` and the entropy-coded scan. Exif
//! lives in an `APP1` segment whose payload starts with `Exif\0\0` followed
//! by a TIFF structure.
//!
//! Only the header segments before `SOS` are walked. Everything from `SOS`
//! on is copied through byte for byte.

use super::exif_io::ExifError;

const SOI: [u8; 2] = [0xFF, 0xD8];
const APP0: u8 = 0xE0;
const APP1: u8 = 0xE1;
const SOS: u8 = 0xDA;
pub(crate) const EXIF_HEADER: &[u8] = b"Exif\0\0";

/// Largest payload an APP1 segment can hold (length field counts its own 2 bytes).
const MAX_SEGMENT_PAYLOAD: usize = 0xFFFF - 2;

/// One header segment: marker byte and the full segment bytes including `FF xx`.
struct Segment<'a> {
    marker: u8,
    bytes: &'a [u8],
}

impl Segment<'_> {
    fn is_exif(&self) -> bool {
        self.marker == APP1 && self.bytes.get(4..).is_some_and(|p| p.starts_with(EXIF_HEADER))
    }
}

/// Split the header of a JPEG into segments; returns them plus the offset
/// where the scan data (or whatever follows the last header segment) begins.
fn header_segments(data: &[u8]) -> Result<(Vec<Segment<'_>>, usize), ExifError> {
    if !data.starts_with(&SOI) {
        return Err(ExifError::NotJpeg);
    }

    let mut segments = Vec::new();
    let mut pos = SOI.len();
    while pos + 1 < data.len() && data[pos] == 0xFF {
        let marker = data[pos + 1];
        // Fill bytes may pad between markers
        if marker == 0xFF {
            pos += 1;
            continue;
        }
        if marker == SOS {
            break;
        }
        let Some(len_bytes) = data.get(pos + 2..pos + 4) else {
            return Err(ExifError::MalformedJpeg(pos));
        };
        let seg_len = u16::from_be_bytes([len_bytes[0], len_bytes[1]]) as usize;
        let end = pos + 2 + seg_len;
        if seg_len < 2 || end > data.len() {
            return Err(ExifError::MalformedJpeg(pos));
        }
        segments.push(Segment {
            marker,
            bytes: &data[pos..end],
        });
        pos = end;
    }

    Ok((segments, pos))
}

/// Return a copy of `jpeg` carrying `tiff` as its only Exif segment.
///
/// The new `APP1` goes directly after `SOI`, or after a leading `APP0`
/// (JFIF) segment when there is one. Existing Exif segments are dropped.
pub(crate) fn with_exif_segment(jpeg: &[u8], tiff: &[u8]) -> Result<Vec<u8>, ExifError> {
    let payload_len = EXIF_HEADER.len() + tiff.len();
    if payload_len > MAX_SEGMENT_PAYLOAD {
        return Err(ExifError::TooLarge(tiff.len()));
    }

    let (segments, rest) = header_segments(jpeg)?;

    let mut app1 = Vec::with_capacity(payload_len + 4);
    app1.extend_from_slice(&[0xFF, APP1]);
    app1.extend_from_slice(&((payload_len + 2) as u16).to_be_bytes());
    app1.extend_from_slice(EXIF_HEADER);
    app1.extend_from_slice(tiff);

    let mut out = Vec::with_capacity(jpeg.len() + app1.len());
    out.extend_from_slice(&SOI);

    let mut kept = segments.iter().filter(|s| !s.is_exif()).peekable();
    if let Some(first) = kept.next_if(|s| s.marker == APP0) {
        out.extend_from_slice(first.bytes);
    }
    out.extend_from_slice(&app1);
    for segment in kept {
        out.extend_from_slice(segment.bytes);
    }
    out.extend_from_slice(&jpeg[rest..]);

    Ok(out)
}

/// Count the Exif `APP1` segments in a JPEG header.
#[cfg(test)]
pub(crate) fn exif_segment_count(jpeg: &[u8]) -> usize {
    header_segments(jpeg)
        .map(|(segments, _)| segments.iter().filter(|s| s.is_exif()).count())
        .unwrap_or(0)
}
