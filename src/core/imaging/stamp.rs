//! Capture-date stamp drawn onto thumbnails.
//!
//! Text is rendered with a built-in 5x7 bitmap font covering digits and
//! the colon, which is all a `YYYY:MM:DD` date needs.

use chrono::NaiveDateTime;
use image::{Rgb, RgbImage};

const GLYPH_WIDTH: u32 = 5;
const GLYPH_HEIGHT: u32 = 7;

/// Top-left corner of the stamp
pub const STAMP_ORIGIN: (u32, u32) = (5, 5);
/// Pixel scale applied to each glyph dot
pub const STAMP_SCALE: u32 = 2;
/// Region whose brightness picks the text color, as (x0, y0, x1, y1)
pub const SAMPLE_REGION: (u32, u32, u32, u32) = (5, 5, 100, 25);

const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Rows of a glyph, most significant of the low five bits on the left
fn glyph(c: char) -> Option<[u8; GLYPH_HEIGHT as usize]> {
    Some(match c {
        '0' => [0x0e, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0e],
        '1' => [0x04, 0x0c, 0x04, 0x04, 0x04, 0x04, 0x0e],
        '2' => [0x0e, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1f],
        '3' => [0x1f, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0e],
        '4' => [0x02, 0x06, 0x0a, 0x12, 0x1f, 0x02, 0x02],
        '5' => [0x1f, 0x10, 0x1e, 0x01, 0x01, 0x11, 0x0e],
        '6' => [0x06, 0x08, 0x10, 0x1e, 0x11, 0x11, 0x0e],
        '7' => [0x1f, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0e, 0x11, 0x11, 0x0e, 0x11, 0x11, 0x0e],
        '9' => [0x0e, 0x11, 0x11, 0x0f, 0x01, 0x02, 0x0c],
        ':' => [0x00, 0x0c, 0x0c, 0x00, 0x0c, 0x0c, 0x00],
        _ => return None,
    })
}

/// Average luminance in [0, 1) over a region, clipped to the image.
/// An empty region counts as dark.
pub fn mean_luminance(image: &RgbImage, region: (u32, u32, u32, u32)) -> f64 {
    let (x0, y0, x1, y1) = region;
    let x1 = x1.min(image.width());
    let y1 = y1.min(image.height());
    if x0 >= x1 || y0 >= y1 {
        return 0.0;
    }

    let mut sum = 0.0;
    for y in y0..y1 {
        for x in x0..x1 {
            let [r, g, b] = image.get_pixel(x, y).0;
            sum += (f64::from(r) + f64::from(g) + f64::from(b)) / 3.0 / 256.0;
        }
    }
    sum / f64::from((x1 - x0) * (y1 - y0))
}

/// Text color readable on top of a region: black on light, white on dark
pub fn contrast_color(image: &RgbImage, region: (u32, u32, u32, u32)) -> Rgb<u8> {
    if mean_luminance(image, region) >= 0.5 {
        BLACK
    } else {
        WHITE
    }
}

/// Draw `text` with its top-left corner at (x, y). Pixels outside the image
/// and characters without a glyph are skipped.
pub fn draw_text(image: &mut RgbImage, text: &str, x: u32, y: u32, scale: u32, color: Rgb<u8>) {
    let advance = (GLYPH_WIDTH + 1) * scale;
    for (i, c) in text.chars().enumerate() {
        let Some(rows) = glyph(c) else { continue };
        let left = x + i as u32 * advance;
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if bits & (1 << (GLYPH_WIDTH - 1 - col)) == 0 {
                    continue;
                }
                let top = y + row as u32 * scale;
                for dy in 0..scale {
                    for dx in 0..scale {
                        let px = left + col * scale + dx;
                        let py = top + dy;
                        if px < image.width() && py < image.height() {
                            image.put_pixel(px, py, color);
                        }
                    }
                }
            }
        }
    }
}

/// Stamp the capture date onto a thumbnail
pub fn stamp_date(image: &mut RgbImage, date: &NaiveDateTime) {
    let text = date.format("%Y:%m:%d").to_string();
    let color = contrast_color(image, SAMPLE_REGION);
    let (x, y) = STAMP_ORIGIN;
    draw_text(image, &text, x, y, STAMP_SCALE, color);
}
