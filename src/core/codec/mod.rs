//! # Codec Module
//!
//! Reads and writes the EXIF tag tree embedded in picture files.
//!
//! ## Locating Metadata
//! - JPEG: the APP1 `Exif` marker segment
//! - HEIC, PNG, WebP, TIFF: the EXIF reader's container support
//! - Anything else, or when the above fails: a search for a TIFF header in
//!   the raw bytes. Such a blob is good for reading only.
//!
//! Missing or corrupt metadata is not an error; the record simply keeps
//! its file-system baseline.
//!
//! ## Writing
//! Only JPEG has a modeled segment layout ([`JpegLayout`]). Other formats
//! are written as pixels without metadata.

mod encode;
mod jpeg;
mod parse;
mod tags;
mod values;

pub use encode::{encode_update, splice_jpeg, write_container};
pub use jpeg::{JpegLayout, Segment, EXIF_HEADER, MAX_SEGMENT_PAYLOAD};

pub(crate) use encode::write_atomic;

use crate::core::record::PictureRecord;
use crate::core::scanner::ImageFormat;
use crate::error::CodecError;
use exif::{Exif, Reader};
use std::fs;
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

/// TIFF header signatures, little- and big-endian
const TIFF_SIGNATURES: [&[u8]; 2] = [b"II*\0", b"MM\0*"];

/// Candidate headers tried by the byte search before giving up
const MAX_SEARCH_CANDIDATES: usize = 16;

/// How a metadata blob was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataOrigin {
    /// JPEG marker segment
    Segment,
    /// Container box or chunk
    Box,
    /// Byte-pattern search
    Search,
}

/// Raw EXIF data (a TIFF structure) found in a file
#[derive(Debug, Clone)]
pub struct RawMetadata {
    pub blob: Vec<u8>,
    pub origin: MetadataOrigin,
}

impl RawMetadata {
    /// Whether the blob can be safely embedded again.
    ///
    /// A blob found by searching may be cut short or belong to an embedded
    /// preview, so it is only read.
    pub fn is_rewritable(&self) -> bool {
        self.origin != MetadataOrigin::Search
    }
}

/// Locate the embedded metadata of a file
pub fn decode(bytes: &[u8], format: ImageFormat) -> Option<RawMetadata> {
    let located = match format {
        ImageFormat::Jpeg => from_jpeg(bytes),
        ImageFormat::Heic | ImageFormat::Png | ImageFormat::WebP | ImageFormat::Tiff => {
            from_container(bytes)
        }
        _ => None,
    };
    located.or_else(|| search(bytes))
}

fn from_jpeg(bytes: &[u8]) -> Option<RawMetadata> {
    let layout = JpegLayout::parse(bytes)
        .map_err(|e| debug!(error = %e, "JPEG layout not readable"))
        .ok()?;
    let blob = layout.exif()?;
    read_blob(blob)?;
    Some(RawMetadata {
        blob: blob.to_vec(),
        origin: MetadataOrigin::Segment,
    })
}

fn from_container(bytes: &[u8]) -> Option<RawMetadata> {
    let exif = Reader::new()
        .read_from_container(&mut Cursor::new(bytes))
        .map_err(|e| debug!(error = %e, "No EXIF in container"))
        .ok()?;
    Some(RawMetadata {
        blob: exif.buf().to_vec(),
        origin: MetadataOrigin::Box,
    })
}

fn search(bytes: &[u8]) -> Option<RawMetadata> {
    bytes
        .windows(4)
        .enumerate()
        .filter(|(_, window)| TIFF_SIGNATURES.contains(window))
        .take(MAX_SEARCH_CANDIDATES)
        .find_map(|(offset, _)| {
            let blob = &bytes[offset..];
            read_blob(blob).map(|_| RawMetadata {
                blob: blob.to_vec(),
                origin: MetadataOrigin::Search,
            })
        })
}

/// Parse a TIFF-structured blob, keeping whatever fields could be read
pub(crate) fn read_blob(blob: &[u8]) -> Option<Exif> {
    let mut reader = Reader::new();
    reader.continue_on_error(true);
    reader
        .read_raw(blob.to_vec())
        .or_else(|e| {
            e.distill_partial_result(|errors| {
                for error in errors {
                    debug!(error = %error, "Ignoring unreadable EXIF entry");
                }
            })
        })
        .ok()
}

/// Build a record from a metadata blob on top of a file-system baseline.
///
/// A blob that cannot be parsed leaves the baseline unchanged.
pub fn parse_fields(blob: &[u8], baseline: &PictureRecord) -> PictureRecord {
    match read_blob(blob) {
        Some(exif) => parse::parse_exif(&exif, baseline),
        None => baseline.clone(),
    }
}

/// Read a file and build its record on top of `baseline`
pub fn read_record(path: &Path, baseline: &PictureRecord) -> Result<PictureRecord, CodecError> {
    let bytes = fs::read(path).map_err(|source| CodecError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(match decode(&bytes, baseline.format) {
        Some(raw) => parse_fields(&raw.blob, baseline),
        None => baseline.clone(),
    })
}

/// Write a record's editable fields back into its JPEG file.
///
/// The pixels are untouched. Returns whether the file changed.
pub fn save_jpeg_metadata(record: &mut PictureRecord) -> Result<bool, CodecError> {
    let bytes = fs::read(&record.file).map_err(|source| CodecError::Io {
        path: record.file.clone(),
        source,
    })?;
    let raw = decode(&bytes, ImageFormat::Jpeg);
    let existing = raw
        .as_ref()
        .filter(|raw| raw.is_rewritable())
        .map(|raw| raw.blob.as_slice());
    let (blob, changed) = encode_update(existing, record)?;
    if !changed {
        return Ok(false);
    }
    let spliced = splice_jpeg(&bytes, &blob)?;
    write_atomic(&record.file, &spliced)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::{Orientation, PixelSize};
    use chrono::{NaiveDate, NaiveDateTime};
    use exif::experimental::Writer;
    use exif::{Field, In, Rational, Tag, Value};
    use image::DynamicImage;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn field(tag: Tag, value: Value) -> Field {
        Field {
            tag,
            ifd_num: In::PRIMARY,
            value,
        }
    }

    fn ascii(text: &str) -> Value {
        Value::Ascii(vec![text.as_bytes().to_vec()])
    }

    fn dms(d: u32, m: u32, s: u32) -> Value {
        Value::Rational(vec![
            Rational { num: d, denom: 1 },
            Rational { num: m, denom: 1 },
            Rational { num: s, denom: 1 },
        ])
    }

    fn blob_from(fields: &[Field]) -> Vec<u8> {
        let mut writer = Writer::new();
        for f in fields {
            writer.push_field(f);
        }
        let mut out = Cursor::new(Vec::new());
        writer.write(&mut out, false).unwrap();
        out.into_inner()
    }

    fn sample_fields() -> Vec<Field> {
        vec![
            field(Tag::Make, ascii("Canon")),
            field(Tag::Orientation, Value::Short(vec![6])),
            field(Tag::DateTimeOriginal, ascii("2021:05:01 10:00:00")),
            field(Tag::PixelXDimension, Value::Long(vec![8])),
            field(Tag::PixelYDimension, Value::Long(vec![6])),
            field(Tag::GPSLatitudeRef, ascii("N")),
            field(Tag::GPSLatitude, dms(40, 26, 46)),
            field(Tag::GPSLongitudeRef, ascii("W")),
            field(Tag::GPSLongitude, dms(79, 58, 56)),
        ]
    }

    fn baseline() -> PictureRecord {
        let modified = SystemTime::UNIX_EPOCH + Duration::from_secs(1_622_505_600);
        PictureRecord::from_file_system("/lib/All/pic.jpg", modified)
    }

    fn date(text: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(text, "%Y:%m:%d %H:%M:%S").unwrap()
    }

    fn write_jpeg(dir: &TempDir, blob: Option<&[u8]>) -> std::path::PathBuf {
        let path = dir.path().join("pic.jpg");
        write_container(&path, blob, &DynamicImage::new_rgb8(8, 6), 90).unwrap();
        path
    }

    #[test]
    fn gps_coordinates_take_hemisphere_sign() {
        let record = parse_fields(&blob_from(&sample_fields()), &baseline());
        assert!((record.gps_loc.lat - 40.446).abs() < 1e-3);
        assert!((record.gps_loc.long + 79.982).abs() < 1e-3);
    }

    #[test]
    fn parse_fills_slots_and_keeps_unknown_tags() {
        let record = parse_fields(&blob_from(&sample_fields()), &baseline());
        assert_eq!(record.orient, Orientation::Rotated90L);
        assert_eq!(record.size, PixelSize::new(8, 6));
        assert_eq!(record.date_taken, Some(date("2021:05:01 10:00:00")));
        assert_eq!(record.date_mod, record.date_taken);
        assert_eq!(record.tags.get("Make").map(String::as_str), Some("Canon"));
        assert!(!record.tags.contains_key("ExifIFDPointer"));
        assert!(!record.tags.contains_key("GPSInfoIFDPointer"));
    }

    #[test]
    fn date_resolution_order() {
        let digitized_only = blob_from(&[
            field(Tag::DateTime, ascii("2020:01:01 00:00:00")),
            field(Tag::DateTimeDigitized, ascii("2019:01:01 00:00:00")),
        ]);
        let record = parse_fields(&digitized_only, &baseline());
        assert_eq!(record.date_taken, Some(date("2019:01:01 00:00:00")));
        assert_eq!(record.date_mod, Some(date("2020:01:01 00:00:00")));

        let no_dates = blob_from(&[field(Tag::Make, ascii("Nikon"))]);
        let base = baseline();
        let record = parse_fields(&no_dates, &base);
        assert_eq!(record.date_taken, base.date_taken);
    }

    #[test]
    fn altitude_below_sea_level_is_negative() {
        let blob = blob_from(&[
            field(Tag::GPSAltitudeRef, Value::Byte(vec![1])),
            field(Tag::GPSAltitude, Value::Rational(vec![Rational { num: 25, denom: 2 }])),
            field(Tag::GPSDateStamp, ascii("2021:05:01")),
            field(Tag::GPSTimeStamp, dms(8, 30, 0)),
        ]);
        let record = parse_fields(&blob, &baseline());
        assert_eq!(record.gps_loc.alt, -12.5);
        assert_eq!(record.gps_date, Some(date("2021:05:01 08:30:00")));
    }

    #[test]
    fn write_container_puts_exif_right_after_soi() {
        let dir = TempDir::new().unwrap();
        let blob = blob_from(&sample_fields());
        let path = write_jpeg(&dir, Some(&blob));

        let bytes = fs::read(&path).unwrap();
        assert_eq!(bytes[..4], [0xff, 0xd8, 0xff, 0xe1]);
        let raw = decode(&bytes, ImageFormat::Jpeg).unwrap();
        assert_eq!(raw.origin, MetadataOrigin::Segment);
        assert!(raw.is_rewritable());
        assert_eq!(raw.blob, blob);
        assert!(image::open(&path).is_ok());
    }

    #[test]
    fn encode_update_of_parsed_record_is_a_no_op() {
        let blob = blob_from(&sample_fields());
        let mut record = parse_fields(&blob, &baseline());
        let before = record.clone();
        let (_, changed) = encode_update(Some(&blob), &mut record).unwrap();
        assert!(!changed);
        assert_eq!(record, before);
    }

    #[test]
    fn changed_date_survives_round_trip_with_other_tags() {
        let dir = TempDir::new().unwrap();
        let path = write_jpeg(&dir, Some(&blob_from(&sample_fields())));

        let mut record = read_record(&path, &baseline()).unwrap();
        record.file = path.clone();
        record.date_taken = Some(date("2022:01:02 03:04:05"));
        assert!(save_jpeg_metadata(&mut record).unwrap());
        assert_ne!(record.date_mod, Some(date("2021:05:01 10:00:00")));

        let reread = read_record(&path, &baseline()).unwrap();
        assert_eq!(reread.date_taken, Some(date("2022:01:02 03:04:05")));
        assert_eq!(reread.tags.get("Make").map(String::as_str), Some("Canon"));
        assert_eq!(reread.orient, Orientation::Rotated90L);
        assert!((reread.gps_loc.lat - 40.446).abs() < 1e-3);

        // nothing left to write
        let mut again = reread.clone();
        again.file = path.clone();
        assert!(!save_jpeg_metadata(&mut again).unwrap());
    }

    #[test]
    fn encode_without_existing_blob_writes_fields() {
        let mut record = baseline();
        record.number = 3;
        record.desc = "harbor".to_string();
        let (blob, changed) = encode_update(None, &mut record).unwrap();
        assert!(changed);

        let parsed = parse_fields(&blob, &baseline());
        assert_eq!(parsed.number, 3);
        assert_eq!(parsed.desc, "harbor");
        assert_eq!(parsed.date_taken, record.date_taken);
        assert_eq!(parsed.date_mod, record.date_mod);
    }

    #[test]
    fn searched_blob_is_read_only() {
        let mut bytes = b"some unrelated container header".to_vec();
        bytes.extend_from_slice(&blob_from(&sample_fields()));
        let raw = decode(&bytes, ImageFormat::Unknown).unwrap();
        assert_eq!(raw.origin, MetadataOrigin::Search);
        assert!(!raw.is_rewritable());
        let record = parse_fields(&raw.blob, &baseline());
        assert_eq!(
            record.date_taken,
            Some(NaiveDate::from_ymd_opt(2021, 5, 1).unwrap().and_hms_opt(10, 0, 0).unwrap())
        );
    }

    #[test]
    fn missing_metadata_is_none() {
        let dir = TempDir::new().unwrap();
        let path = write_jpeg(&dir, None);
        let bytes = fs::read(&path).unwrap();
        assert!(decode(&bytes, ImageFormat::Jpeg).is_none());
        assert!(decode(b"", ImageFormat::Png).is_none());

        let base = baseline();
        assert_eq!(read_record(&path, &base).unwrap(), base);
    }

    #[test]
    fn broken_entry_does_not_hide_the_rest() {
        let mut blob = blob_from(&[
            field(Tag::Make, ascii("Canon")),
            field(Tag::Orientation, Value::Short(vec![6])),
        ]);
        // big-endian IFD0: point the Make value past the end of the blob
        assert_eq!(&blob[..2], b"MM");
        let ifd = u32::from_be_bytes([blob[4], blob[5], blob[6], blob[7]]) as usize;
        let count = u16::from_be_bytes([blob[ifd], blob[ifd + 1]]) as usize;
        let make = (0..count)
            .map(|i| ifd + 2 + i * 12)
            .find(|&entry| blob[entry..entry + 2] == [0x01, 0x0f])
            .unwrap();
        blob[make + 8..make + 12].copy_from_slice(&0xffff_ff00u32.to_be_bytes());

        let record = parse_fields(&blob, &baseline());
        assert_eq!(record.orient, Orientation::Rotated90L);
        assert!(!record.tags.contains_key("Make"));
    }

    #[test]
    fn corrupt_blob_keeps_baseline() {
        let base = baseline();
        assert_eq!(parse_fields(b"II*\0garbage", &base), base);
    }
}
