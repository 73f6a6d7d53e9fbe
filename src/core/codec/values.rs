//! Conversions between EXIF values and record fields.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use exif::{Field, Value};

const DATE_TIME_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// Numeric component at `index`. Rationals with a zero denominator give 0.
pub(crate) fn number_at(value: &Value, index: usize) -> Option<f64> {
    match value {
        Value::Byte(v) => v.get(index).map(|&x| f64::from(x)),
        Value::Short(v) => v.get(index).map(|&x| f64::from(x)),
        Value::Long(v) => v.get(index).map(|&x| f64::from(x)),
        Value::SByte(v) => v.get(index).map(|&x| f64::from(x)),
        Value::SShort(v) => v.get(index).map(|&x| f64::from(x)),
        Value::SLong(v) => v.get(index).map(|&x| f64::from(x)),
        Value::Float(v) => v.get(index).map(|&x| f64::from(x)),
        Value::Double(v) => v.get(index).copied(),
        Value::Rational(v) => v.get(index).map(|r| ratio(f64::from(r.num), f64::from(r.denom))),
        Value::SRational(v) => v
            .get(index)
            .map(|r| ratio(f64::from(r.num), f64::from(r.denom))),
        _ => None,
    }
}

fn ratio(num: f64, denom: f64) -> f64 {
    if denom == 0.0 {
        0.0
    } else {
        num / denom
    }
}

pub(crate) fn number(value: &Value) -> Option<f64> {
    number_at(value, 0)
}

/// First component of an unsigned integer value
pub(crate) fn uint(value: &Value) -> Option<u32> {
    value.get_uint(0)
}

/// Three numeric components, as used by GPS coordinates and times
pub(crate) fn triplet(value: &Value) -> Option<[f64; 3]> {
    Some([
        number_at(value, 0)?,
        number_at(value, 1)?,
        number_at(value, 2)?,
    ])
}

/// First string of an ASCII value, without padding
pub(crate) fn text(value: &Value) -> Option<String> {
    match value {
        Value::Ascii(parts) => parts.first().map(|part| {
            String::from_utf8_lossy(part)
                .trim_end_matches('\0')
                .trim()
                .to_string()
        }),
        _ => None,
    }
}

pub(crate) fn ascii(text: &str) -> Value {
    Value::Ascii(vec![text.as_bytes().to_vec()])
}

/// Text kept in the open tag map for a field without a dedicated slot
pub(crate) fn display_text(field: &Field) -> String {
    text(&field.value).unwrap_or_else(|| field.display_value().to_string())
}

/// Parse an EXIF date. All-zero placeholders are treated as absent.
pub(crate) fn parse_date(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    NaiveDateTime::parse_from_str(text, DATE_TIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S"))
        .ok()
}

pub(crate) fn format_date(date: &NaiveDateTime) -> String {
    date.format(DATE_TIME_FORMAT).to_string()
}

/// Combine a GPS date stamp with a GPS time-of-day triplet
pub(crate) fn gps_date(stamp: &str, time: Option<[f64; 3]>) -> Option<NaiveDateTime> {
    let date = NaiveDate::parse_from_str(stamp.trim(), "%Y:%m:%d").ok()?;
    let [h, m, s] = time.unwrap_or_default();
    let secs = (h * 3600.0 + m * 60.0 + s).max(0.0) as u32;
    let time = NaiveTime::from_num_seconds_from_midnight_opt(secs % 86_400, 0)?;
    Some(date.and_time(time))
}
