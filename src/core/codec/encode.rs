//! Metadata encoding and container writing.

use super::jpeg::JpegLayout;
use super::parse::parse_exif;
use super::read_blob;
use super::tags::{self, Slot};
use super::values;
use crate::core::record::{Orientation, PictureRecord};
use crate::core::scanner::ImageFormat;
use crate::error::CodecError;
use chrono::{Local, NaiveDateTime, Timelike};
use exif::experimental::Writer;
use exif::{Field, In, Tag, Value};
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use std::fs;
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info};

/// Tags whose values are offsets the writer recomputes or cannot relocate
const OFFSET_TAGS: [Tag; 7] = [
    Tag::ExifIFDPointer,
    Tag::GPSInfoIFDPointer,
    Tag::InteropIFDPointer,
    Tag::JPEGInterchangeFormat,
    Tag::JPEGInterchangeFormatLength,
    Tag::StripOffsets,
    Tag::StripByteCounts,
];

fn is_rewritable(field: &Field) -> bool {
    !matches!(field.value, Value::Unknown(..)) && !OFFSET_TAGS.contains(&field.tag)
}

/// Replace the primary-image field for a slot, or add it
fn put(fields: &mut Vec<Field>, slot: Slot, value: Value) -> Result<(), CodecError> {
    let tag = tags::tag_for(slot)
        .ok_or_else(|| CodecError::Encode(format!("no tag for {:?}", slot)))?;
    let field = Field {
        tag,
        ifd_num: In::PRIMARY,
        value,
    };
    match fields.iter_mut().find(|f| f.tag == tag) {
        Some(existing) => *existing = field,
        None => fields.push(field),
    }
    Ok(())
}

/// Current time, truncated to what an EXIF date can hold
fn now() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

/// Merge a record's editable fields into an existing EXIF blob.
///
/// Only the scalars that differ from what the blob already says are written:
/// date taken, burst number, pixel size, orientation and description. When
/// anything changed, `record.date_mod` is set to now and stamped into the
/// DateTime tag. Returns the new blob and whether it differs.
///
/// Fields of the thumbnail IFD are not carried over.
pub fn encode_update(
    existing: Option<&[u8]>,
    record: &mut PictureRecord,
) -> Result<(Vec<u8>, bool), CodecError> {
    let baseline = record.file_baseline();
    let parsed = existing.and_then(read_blob);
    let (current, mut fields, little_endian) = match &parsed {
        Some(exif) => (
            parse_exif(exif, &baseline),
            exif.fields()
                .filter(|f| f.ifd_num == In::PRIMARY && is_rewritable(f))
                .cloned()
                .collect::<Vec<_>>(),
            exif.little_endian(),
        ),
        None => (baseline, Vec::new(), false),
    };

    let mut changed = false;
    if record.date_taken != current.date_taken {
        if let Some(date) = record.date_taken {
            put(
                &mut fields,
                Slot::DateTimeOriginal,
                values::ascii(&values::format_date(&date)),
            )?;
            changed = true;
        }
    }
    if record.number != current.number {
        put(&mut fields, Slot::ImageNumber, Value::Long(vec![record.number]))?;
        changed = true;
    }
    if record.size.width != current.size.width {
        put(&mut fields, Slot::PixelX, Value::Long(vec![record.size.width]))?;
        changed = true;
    }
    if record.size.height != current.size.height {
        put(&mut fields, Slot::PixelY, Value::Long(vec![record.size.height]))?;
        changed = true;
    }
    if record.orient != current.orient && record.orient != Orientation::Unknown {
        put(
            &mut fields,
            Slot::Orientation,
            Value::Short(vec![record.orient.code()]),
        )?;
        changed = true;
    }
    if record.desc != current.desc {
        put(&mut fields, Slot::Desc, values::ascii(&record.desc))?;
        changed = true;
    }

    if changed {
        // pin the capture date before DateTime moves, or it would fall back to it
        let has_original = tags::tag_for(Slot::DateTimeOriginal)
            .map(|tag| fields.iter().any(|f| f.tag == tag))
            .unwrap_or(false);
        if let (false, Some(date)) = (has_original, record.date_taken) {
            put(
                &mut fields,
                Slot::DateTimeOriginal,
                values::ascii(&values::format_date(&date)),
            )?;
        }
        let modified = now();
        record.date_mod = Some(modified);
        put(
            &mut fields,
            Slot::DateTime,
            values::ascii(&values::format_date(&modified)),
        )?;
        debug!(file = %record.file.display(), "Metadata updated");
    }

    let mut writer = Writer::new();
    for field in &fields {
        writer.push_field(field);
    }
    let mut blob = Cursor::new(Vec::new());
    writer
        .write(&mut blob, little_endian)
        .map_err(|e| CodecError::Encode(e.to_string()))?;
    Ok((blob.into_inner(), changed))
}

/// Rewrite the EXIF segment of an existing JPEG without touching its pixels
pub fn splice_jpeg(bytes: &[u8], blob: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut layout = JpegLayout::parse(bytes)?;
    layout.set_exif(blob, false)?;
    Ok(layout.to_bytes())
}

/// Write a new image file from pixels, embedding `blob` where the format
/// allows it.
///
/// JPEG output drops the encoder's JFIF header and carries the EXIF segment
/// directly after SOI. Other formats are saved without metadata.
pub fn write_container(
    path: &Path,
    blob: Option<&[u8]>,
    pixels: &DynamicImage,
    quality: u8,
) -> Result<(), CodecError> {
    let format = ImageFormat::from_path(path);
    if format != ImageFormat::Jpeg {
        info!(
            file = %path.display(),
            format = ?format,
            "No metadata layout for this format, saving pixels only"
        );
        return pixels.save(path).map_err(|e| CodecError::Encode(e.to_string()));
    }

    let mut encoded = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut encoded, quality);
    DynamicImage::ImageRgb8(pixels.to_rgb8())
        .write_with_encoder(encoder)
        .map_err(|e| CodecError::Encode(e.to_string()))?;

    let bytes = match blob {
        Some(blob) => {
            let mut layout = JpegLayout::parse(&encoded)?;
            layout.set_exif(blob, true)?;
            layout.to_bytes()
        }
        None => encoded,
    };
    write_atomic(path, &bytes)
}

/// Replace a file by writing a sibling and renaming it over the original
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), CodecError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(".{}.tmp", name));
    let io_err = |source: std::io::Error| CodecError::Io {
        path: path.to_path_buf(),
        source,
    };
    fs::write(&tmp, bytes).map_err(io_err)?;
    fs::rename(&tmp, path).map_err(|source| {
        let _ = fs::remove_file(&tmp);
        io_err(source)
    })
}
