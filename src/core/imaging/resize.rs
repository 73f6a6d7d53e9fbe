//! SIMD-accelerated downsampling for thumbnails.

use crate::error::ImagingError;
use fast_image_resize::{images::Image, FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};
use image::{DynamicImage, RgbImage};
use std::path::PathBuf;

/// Largest size with the same aspect ratio that fits in `max` x `max`.
/// Never larger than the source.
pub fn fit_within(width: u32, height: u32, max: u32) -> (u32, u32) {
    let longest = width.max(height);
    if longest <= max || longest == 0 {
        return (width, height);
    }
    let scale = f64::from(max) / f64::from(longest);
    let w = ((f64::from(width) * scale).round() as u32).max(1);
    let h = ((f64::from(height) * scale).round() as u32).max(1);
    (w, h)
}

/// Reusable RGB resizer
pub struct FastResizer {
    resizer: Resizer,
}

impl FastResizer {
    pub fn new() -> Self {
        Self {
            resizer: Resizer::new(),
        }
    }

    /// Downsample to fit within `max` pixels on the longest side
    pub fn thumbnail(&mut self, image: &DynamicImage, max: u32) -> Result<RgbImage, ImagingError> {
        let rgb = image.to_rgb8();
        let (src_w, src_h) = rgb.dimensions();
        if src_w == 0 || src_h == 0 {
            return Err(resize_error("empty source image"));
        }
        let (dst_w, dst_h) = fit_within(src_w, src_h, max);
        if (dst_w, dst_h) == (src_w, src_h) {
            return Ok(rgb);
        }

        let src = Image::from_vec_u8(src_w, src_h, rgb.into_raw(), PixelType::U8x3)
            .map_err(|e| resize_error(format!("source buffer: {}", e)))?;
        let mut dst = Image::new(dst_w, dst_h, PixelType::U8x3);
        let options =
            ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear));
        self.resizer
            .resize(&src, &mut dst, &options)
            .map_err(|e| resize_error(e.to_string()))?;

        RgbImage::from_raw(dst_w, dst_h, dst.into_vec())
            .ok_or_else(|| resize_error("destination buffer size mismatch"))
    }
}

impl Default for FastResizer {
    fn default() -> Self {
        Self::new()
    }
}

fn resize_error(reason: impl Into<String>) -> ImagingError {
    ImagingError::DecodeError {
        path: PathBuf::new(),
        reason: format!("resize failed: {}", reason.into()),
    }
}
