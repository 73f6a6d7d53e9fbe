//! Pixel transforms for orientation and user rotation.

use crate::core::record::Orientation;
use image::DynamicImage;

/// Transform stored pixels into their display orientation
pub fn apply_orientation(image: DynamicImage, orient: Orientation) -> DynamicImage {
    match orient {
        Orientation::FlippedH => image.fliph(),
        Orientation::Rotated180 => image.rotate180(),
        Orientation::FlippedV => image.flipv(),
        Orientation::FlippedHRotated90L => image.rotate90().fliph(),
        Orientation::Rotated90L => image.rotate90(),
        Orientation::FlippedHRotated90R => image.rotate270().fliph(),
        Orientation::Rotated90R => image.rotate270(),
        Orientation::Undefined | Orientation::Normal | Orientation::Unknown => image,
    }
}

/// Rotate pixels clockwise by a right angle; other angles return `None`
pub fn rotate_pixels(image: &DynamicImage, degrees: i32) -> Option<DynamicImage> {
    match degrees {
        90 => Some(image.rotate90()),
        -90 => Some(image.rotate270()),
        180 | -180 => Some(image.rotate180()),
        _ => None,
    }
}
