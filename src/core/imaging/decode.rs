//! Pixel decoding with a fast path per format.
//!
//! JPEG goes through zune-jpeg, HEIC through the macOS `sips` converter,
//! everything else (and any fast-path failure) through the image crate.

use crate::core::scanner::ImageFormat;
use crate::error::ImagingError;
use image::{DynamicImage, ImageBuffer, Pixel};
use std::fs;
use std::path::Path;
#[cfg(target_os = "macos")]
use std::process::Command;
use zune_core::colorspace::ColorSpace;
use zune_core::options::DecoderOptions;
use zune_jpeg::JpegDecoder;

/// Format-dispatched image decoder
pub struct FastDecoder;

impl FastDecoder {
    /// Decode the pixels of a picture file
    pub fn decode(path: &Path, format: ImageFormat) -> Result<DynamicImage, ImagingError> {
        match format {
            ImageFormat::Jpeg => Self::decode_jpeg(path).or_else(|_| Self::decode_generic(path)),
            ImageFormat::Heic => Self::decode_heic(path),
            ImageFormat::Unknown => Err(ImagingError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
            _ => Self::decode_generic(path),
        }
    }

    fn decode_jpeg(path: &Path) -> Result<DynamicImage, ImagingError> {
        let bytes = fs::read(path).map_err(|source| ImagingError::IoError {
            path: path.to_path_buf(),
            source,
        })?;

        let options = DecoderOptions::new_fast().jpeg_set_out_colorspace(ColorSpace::RGB);
        let mut decoder = JpegDecoder::new_with_options(&bytes, options);
        let pixels = decoder.decode().map_err(|e| decode_error(path, format!("{:?}", e)))?;
        let info = decoder
            .info()
            .ok_or_else(|| decode_error(path, "no frame header"))?;
        let (width, height) = (u32::from(info.width), u32::from(info.height));

        match decoder.get_output_colorspace().unwrap_or(ColorSpace::RGB) {
            ColorSpace::RGB => from_raw::<image::Rgb<u8>>(path, width, height, pixels)
                .map(DynamicImage::ImageRgb8),
            ColorSpace::RGBA => from_raw::<image::Rgba<u8>>(path, width, height, pixels)
                .map(DynamicImage::ImageRgba8),
            ColorSpace::Luma => from_raw::<image::Luma<u8>>(path, width, height, pixels)
                .map(DynamicImage::ImageLuma8),
            other => Err(decode_error(path, format!("colorspace {:?}", other))),
        }
    }

    /// Convert through the system image tool, which reads HEIC natively
    #[cfg(target_os = "macos")]
    fn decode_heic(path: &Path) -> Result<DynamicImage, ImagingError> {
        let converted = std::env::temp_dir().join(format!(
            "pixfolio_{}_{}.jpg",
            std::process::id(),
            crate::core::scanner::base_name(path)
        ));
        let output = Command::new("sips")
            .arg("-s")
            .arg("format")
            .arg("jpeg")
            .arg(path)
            .arg("--out")
            .arg(&converted)
            .output()
            .map_err(|e| decode_error(path, format!("failed to run sips: {}", e)))?;

        let result = if output.status.success() {
            image::open(&converted).map_err(|e| decode_error(path, e.to_string()))
        } else {
            Err(decode_error(
                path,
                format!("sips failed: {}", String::from_utf8_lossy(&output.stderr)),
            ))
        };
        let _ = fs::remove_file(&converted);
        result
    }

    #[cfg(not(target_os = "macos"))]
    fn decode_heic(path: &Path) -> Result<DynamicImage, ImagingError> {
        Err(decode_error(path, "HEIC decoding is only supported on macOS"))
    }

    fn decode_generic(path: &Path) -> Result<DynamicImage, ImagingError> {
        image::open(path).map_err(|e| decode_error(path, e.to_string()))
    }
}

fn from_raw<P: Pixel<Subpixel = u8>>(
    path: &Path,
    width: u32,
    height: u32,
    pixels: Vec<u8>,
) -> Result<ImageBuffer<P, Vec<u8>>, ImagingError> {
    ImageBuffer::from_raw(width, height, pixels)
        .ok_or_else(|| decode_error(path, "pixel buffer does not match dimensions"))
}

fn decode_error(path: &Path, reason: impl Into<String>) -> ImagingError {
    ImagingError::DecodeError {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}
