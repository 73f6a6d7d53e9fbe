//! Field parsing: EXIF tag tree to picture record.

use super::tags::{self, Slot, TagSpec};
use super::values;
use crate::core::record::{dec_deg_from_dms, Orientation, PictureRecord, PixelSize};
use chrono::NaiveDateTime;
use exif::{Exif, In, Value};
use tracing::warn;

/// Values that only make sense once every field has been seen
#[derive(Default)]
struct Pending {
    date_original: Option<NaiveDateTime>,
    date_digitized: Option<NaiveDateTime>,
    date_time: Option<NaiveDateTime>,
    image_width: Option<u32>,
    image_length: Option<u32>,
    pixel_x: Option<u32>,
    pixel_y: Option<u32>,
    lat: Option<[f64; 3]>,
    lat_ref: Option<String>,
    long: Option<[f64; 3]>,
    long_ref: Option<String>,
    alt: Option<f64>,
    alt_below_sea: bool,
    gps_date_stamp: Option<String>,
    gps_time: Option<[f64; 3]>,
}

/// Build a record from parsed EXIF data on top of a file-system baseline.
///
/// Only the primary image's fields are used; thumbnail IFD fields would
/// shadow them.
pub(crate) fn parse_exif(exif: &Exif, baseline: &PictureRecord) -> PictureRecord {
    let mut record = baseline.clone();
    let mut pending = Pending::default();

    for field in exif.fields() {
        if field.ifd_num != In::PRIMARY {
            continue;
        }
        match tags::lookup(field.tag) {
            Some(spec) => {
                if apply(spec, &field.value, &mut record, &mut pending).is_none() {
                    warn!(
                        file = %record.file.display(),
                        tag = spec.name,
                        value = %field.display_value(),
                        "Skipping tag with unexpected value type"
                    );
                }
            }
            None => {
                record
                    .tags
                    .insert(field.tag.to_string(), values::display_text(field));
            }
        }
    }

    finish(pending, &mut record, baseline);
    record
}

/// Store one field. `None` means the value could not be converted.
fn apply(
    spec: &TagSpec,
    value: &Value,
    record: &mut PictureRecord,
    pending: &mut Pending,
) -> Option<()> {
    match spec.slot {
        Slot::Desc => record.desc = values::text(value)?,
        Slot::ImageWidth => pending.image_width = Some(values::uint(value)?),
        Slot::ImageLength => pending.image_length = Some(values::uint(value)?),
        Slot::PixelX => pending.pixel_x = Some(values::uint(value)?),
        Slot::PixelY => pending.pixel_y = Some(values::uint(value)?),
        Slot::BitsPerSample => {
            record.depth = u8::try_from(values::uint(value)?).ok()?;
        }
        Slot::Orientation => record.orient = Orientation::from_code(values::uint(value)?),
        Slot::DateTime => pending.date_time = values::parse_date(&values::text(value)?),
        Slot::DateTimeOriginal => {
            pending.date_original = values::parse_date(&values::text(value)?)
        }
        Slot::DateTimeDigitized => {
            pending.date_digitized = values::parse_date(&values::text(value)?)
        }
        Slot::ImageNumber => record.number = values::uint(value)?,
        Slot::GpsLatitude => pending.lat = Some(values::triplet(value)?),
        Slot::GpsLatitudeRef => pending.lat_ref = Some(values::text(value)?),
        Slot::GpsLongitude => pending.long = Some(values::triplet(value)?),
        Slot::GpsLongitudeRef => pending.long_ref = Some(values::text(value)?),
        Slot::GpsAltitude => pending.alt = Some(values::number(value)?),
        Slot::GpsAltitudeRef => pending.alt_below_sea = values::uint(value)? == 1,
        Slot::GpsDestBearing => record.gps_misc.dest_bearing = values::number(value)?,
        Slot::GpsDestBearingRef => record.gps_misc.dest_bearing_ref = values::text(value)?,
        Slot::GpsImgDirection => record.gps_misc.img_dir = values::number(value)?,
        Slot::GpsImgDirectionRef => record.gps_misc.img_dir_ref = values::text(value)?,
        Slot::GpsSpeed => record.gps_misc.speed = values::number(value)?,
        Slot::GpsSpeedRef => record.gps_misc.speed_ref = values::text(value)?,
        Slot::GpsDateStamp => pending.gps_date_stamp = Some(values::text(value)?),
        Slot::GpsTimeStamp => pending.gps_time = Some(values::triplet(value)?),
        Slot::ExposureTime => record.exposure.time = values::number(value)?,
        Slot::FNumber => record.exposure.f_stop = values::number(value)?,
        Slot::IsoSpeed => record.exposure.iso_speed = values::number(value)?,
        Slot::FocalLength => record.exposure.focal_len = values::number(value)?,
        Slot::Aperture => record.exposure.aperture = values::number(value)?,
        Slot::Ignore => {}
    }
    Some(())
}

fn finish(pending: Pending, record: &mut PictureRecord, baseline: &PictureRecord) {
    record.date_taken = pending
        .date_original
        .or(pending.date_digitized)
        .or(pending.date_time)
        .or(baseline.date_taken);
    record.date_mod = match pending.date_time {
        Some(modified) if Some(modified) != record.date_taken => Some(modified),
        _ => record.date_taken,
    };

    let width = pending.pixel_x.or(pending.image_width);
    let height = pending.pixel_y.or(pending.image_length);
    if let (Some(width), Some(height)) = (width, height) {
        record.size = PixelSize::new(width, height);
    }

    if let Some([d, m, s]) = pending.lat {
        let sign = hemisphere_sign(pending.lat_ref.as_deref(), "S");
        record.gps_loc.lat = sign * dec_deg_from_dms(d, m, s);
    }
    if let Some([d, m, s]) = pending.long {
        let sign = hemisphere_sign(pending.long_ref.as_deref(), "W");
        record.gps_loc.long = sign * dec_deg_from_dms(d, m, s);
    }
    if let Some(alt) = pending.alt {
        record.gps_loc.alt = if pending.alt_below_sea { -alt } else { alt };
    }
    if let Some(stamp) = pending.gps_date_stamp {
        record.gps_date = values::gps_date(&stamp, pending.gps_time);
    }
}

fn hemisphere_sign(reference: Option<&str>, negative: &str) -> f64 {
    match reference {
        Some(r) if r.eq_ignore_ascii_case(negative) => -1.0,
        _ => 1.0,
    }
}
