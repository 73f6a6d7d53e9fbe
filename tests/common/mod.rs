//! Shared fixtures for integration tests.

#![allow(dead_code)]

use assert_fs::TempDir;
use chrono::{Local, TimeZone};
use exif::experimental::Writer;
use exif::{Field, In, Rational, Tag, Value};
use image::{DynamicImage, Rgb, RgbImage};
use pixfolio::core::codec::write_container;
use pixfolio::Library;
use std::fs::File;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub fn open_library(temp: &TempDir) -> Library {
    Library::builder(temp.path().join("lib"))
        .thumb_dir(temp.path().join("thumbs"))
        .workers(2)
        .open()
        .unwrap()
}

pub fn all_dir(temp: &TempDir) -> PathBuf {
    temp.path().join("lib").join("All")
}

pub fn field(tag: Tag, value: Value) -> Field {
    Field {
        tag,
        ifd_num: In::PRIMARY,
        value,
    }
}

pub fn ascii(text: &str) -> Value {
    Value::Ascii(vec![text.as_bytes().to_vec()])
}

pub fn dms(d: u32, m: u32, s_hundredths: u32) -> Value {
    Value::Rational(vec![
        Rational { num: d, denom: 1 },
        Rational { num: m, denom: 1 },
        Rational {
            num: s_hundredths,
            denom: 100,
        },
    ])
}

pub fn taken(date: &str) -> Vec<Field> {
    vec![field(Tag::DateTimeOriginal, ascii(date))]
}

/// Write a small JPEG carrying `fields` (none: no metadata at all)
pub fn write_jpeg(path: &Path, fields: &[Field], shade: u8) {
    let pixels = DynamicImage::ImageRgb8(RgbImage::from_pixel(24, 16, Rgb([shade, 90, 160])));
    let blob = (!fields.is_empty()).then(|| {
        let mut writer = Writer::new();
        for f in fields {
            writer.push_field(f);
        }
        let mut out = Cursor::new(Vec::new());
        writer.write(&mut out, false).unwrap();
        out.into_inner()
    });
    write_container(path, blob.as_deref(), &pixels, 90).unwrap();
}

/// Local wall-clock time as a file system time
pub fn local_time(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> SystemTime {
    Local
        .with_ymd_and_hms(y, mo, d, h, mi, s)
        .single()
        .unwrap()
        .into()
}

pub fn set_mtime(path: &Path, time: SystemTime) {
    File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(time)
        .unwrap();
}

pub fn mtime(path: &Path) -> SystemTime {
    std::fs::metadata(path).unwrap().modified().unwrap()
}
