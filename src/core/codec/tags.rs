//! Declarative tag table shared by the parser and the encoder.
//!
//! Every tag with a dedicated record field, plus the structural tags that are
//! never copied into the open tag map, is listed once here.

use exif::{Context, Tag};
use std::collections::HashMap;
use std::sync::OnceLock;

/// Where a tag's value lands in a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Slot {
    Desc,
    ImageWidth,
    ImageLength,
    PixelX,
    PixelY,
    BitsPerSample,
    Orientation,
    DateTime,
    DateTimeOriginal,
    DateTimeDigitized,
    ImageNumber,
    GpsLatitude,
    GpsLatitudeRef,
    GpsLongitude,
    GpsLongitudeRef,
    GpsAltitude,
    GpsAltitudeRef,
    GpsDestBearing,
    GpsDestBearingRef,
    GpsImgDirection,
    GpsImgDirectionRef,
    GpsSpeed,
    GpsSpeedRef,
    GpsDateStamp,
    GpsTimeStamp,
    ExposureTime,
    FNumber,
    IsoSpeed,
    FocalLength,
    Aperture,
    /// Structural or opaque data, neither modeled nor kept in the tag map
    Ignore,
}

#[derive(Debug)]
pub(crate) struct TagSpec {
    pub tag: Tag,
    pub name: &'static str,
    pub slot: Slot,
}

/// Burst number. Not among the tags the EXIF reader knows by name.
pub(crate) const IMAGE_NUMBER: Tag = Tag(Context::Tiff, 0x9211);

const INTEROP_VERSION: Tag = Tag(Context::Interop, 0x0002);
const PRINT_IM: Tag = Tag(Context::Tiff, 0xc4a5);

macro_rules! spec {
    ($tag:expr, $name:literal, $slot:ident) => {
        TagSpec {
            tag: $tag,
            name: $name,
            slot: Slot::$slot,
        }
    };
}

pub(crate) static TAG_TABLE: &[TagSpec] = &[
    spec!(Tag::ImageDescription, "ImageDescription", Desc),
    spec!(Tag::ImageWidth, "ImageWidth", ImageWidth),
    spec!(Tag::ImageLength, "ImageLength", ImageLength),
    spec!(Tag::PixelXDimension, "PixelXDimension", PixelX),
    spec!(Tag::PixelYDimension, "PixelYDimension", PixelY),
    spec!(Tag::BitsPerSample, "BitsPerSample", BitsPerSample),
    spec!(Tag::Orientation, "Orientation", Orientation),
    spec!(Tag::DateTime, "DateTime", DateTime),
    spec!(Tag::DateTimeOriginal, "DateTimeOriginal", DateTimeOriginal),
    spec!(Tag::DateTimeDigitized, "DateTimeDigitized", DateTimeDigitized),
    spec!(IMAGE_NUMBER, "ImageNumber", ImageNumber),
    spec!(Tag::GPSLatitude, "GPSLatitude", GpsLatitude),
    spec!(Tag::GPSLatitudeRef, "GPSLatitudeRef", GpsLatitudeRef),
    spec!(Tag::GPSLongitude, "GPSLongitude", GpsLongitude),
    spec!(Tag::GPSLongitudeRef, "GPSLongitudeRef", GpsLongitudeRef),
    spec!(Tag::GPSAltitude, "GPSAltitude", GpsAltitude),
    spec!(Tag::GPSAltitudeRef, "GPSAltitudeRef", GpsAltitudeRef),
    spec!(Tag::GPSDestBearing, "GPSDestBearing", GpsDestBearing),
    spec!(Tag::GPSDestBearingRef, "GPSDestBearingRef", GpsDestBearingRef),
    spec!(Tag::GPSImgDirection, "GPSImgDirection", GpsImgDirection),
    spec!(Tag::GPSImgDirectionRef, "GPSImgDirectionRef", GpsImgDirectionRef),
    spec!(Tag::GPSSpeed, "GPSSpeed", GpsSpeed),
    spec!(Tag::GPSSpeedRef, "GPSSpeedRef", GpsSpeedRef),
    spec!(Tag::GPSDateStamp, "GPSDateStamp", GpsDateStamp),
    spec!(Tag::GPSTimeStamp, "GPSTimeStamp", GpsTimeStamp),
    spec!(Tag::ExposureTime, "ExposureTime", ExposureTime),
    spec!(Tag::FNumber, "FNumber", FNumber),
    spec!(Tag::PhotographicSensitivity, "ISOSpeedRatings", IsoSpeed),
    spec!(Tag::FocalLength, "FocalLength", FocalLength),
    spec!(Tag::ApertureValue, "ApertureValue", Aperture),
    spec!(Tag::ExifIFDPointer, "ExifIFDPointer", Ignore),
    spec!(Tag::GPSInfoIFDPointer, "GPSInfoIFDPointer", Ignore),
    spec!(Tag::InteropIFDPointer, "InteropIFDPointer", Ignore),
    spec!(Tag::JPEGInterchangeFormat, "JPEGInterchangeFormat", Ignore),
    spec!(Tag::JPEGInterchangeFormatLength, "JPEGInterchangeFormatLength", Ignore),
    spec!(Tag::MakerNote, "MakerNote", Ignore),
    spec!(Tag::UserComment, "UserComment", Ignore),
    spec!(Tag::ComponentsConfiguration, "ComponentsConfiguration", Ignore),
    spec!(Tag::ExifVersion, "ExifVersion", Ignore),
    spec!(Tag::FlashpixVersion, "FlashpixVersion", Ignore),
    spec!(Tag::GPSVersionID, "GPSVersionID", Ignore),
    spec!(Tag::InteroperabilityIndex, "InteroperabilityIndex", Ignore),
    spec!(INTEROP_VERSION, "InteroperabilityVersion", Ignore),
    spec!(PRINT_IM, "PrintIM", Ignore),
];

fn by_tag() -> &'static HashMap<Tag, &'static TagSpec> {
    static INDEX: OnceLock<HashMap<Tag, &'static TagSpec>> = OnceLock::new();
    INDEX.get_or_init(|| TAG_TABLE.iter().map(|spec| (spec.tag, spec)).collect())
}

/// Table entry for a tag, if it has one
pub(crate) fn lookup(tag: Tag) -> Option<&'static TagSpec> {
    by_tag().get(&tag).copied()
}

/// Tag written for a slot
pub(crate) fn tag_for(slot: Slot) -> Option<Tag> {
    TAG_TABLE
        .iter()
        .find(|spec| spec.slot == slot)
        .map(|spec| spec.tag)
}
