//! # Thumbs Module
//!
//! Size-bounded, date-stamped JPEG thumbnails, one per picture, named
//! `<base>.jpg` in the thumbnail directory.
//!
//! A thumbnail is stale when it is missing or older than its source file.
//! Thumbnails can be deleted wholesale; they are rebuilt on the next
//! reconciliation.

use crate::core::imaging::{apply_orientation, stamp_date, FastDecoder, FastResizer};
use crate::core::record::PictureRecord;
use crate::error::ImagingError;
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use std::fs;
use std::path::Path;
use std::time::SystemTime;
use tracing::debug;

/// Longest side of a thumbnail, in pixels
pub const DEFAULT_THUMB_SIZE: u32 = 256;

/// JPEG quality of thumbnails
pub const DEFAULT_THUMB_QUALITY: u8 = 85;

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Whether a thumbnail needs to be (re)built for a source file
pub fn is_stale(source: &Path, thumb: &Path) -> bool {
    match (modified(source), modified(thumb)) {
        (Some(source), Some(thumb)) => thumb < source,
        (_, None) => true,
        (None, Some(_)) => false,
    }
}

/// Builds thumbnails for records
#[derive(Debug, Clone)]
pub struct ThumbnailGenerator {
    max_size: u32,
    quality: u8,
}

impl Default for ThumbnailGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_THUMB_SIZE, DEFAULT_THUMB_QUALITY)
    }
}

impl ThumbnailGenerator {
    pub fn new(max_size: u32, quality: u8) -> Self {
        Self { max_size, quality }
    }

    /// Build the thumbnail only if it is missing or older than the file.
    /// Returns whether one was built.
    pub fn generate_if_needed(&self, record: &PictureRecord) -> Result<bool, ImagingError> {
        if !is_stale(&record.file, &record.thumb) {
            return Ok(false);
        }
        self.generate(record)?;
        Ok(true)
    }

    /// Decode, orient, downsample, stamp and save the thumbnail
    pub fn generate(&self, record: &PictureRecord) -> Result<(), ImagingError> {
        let pixels = FastDecoder::decode(&record.file, record.format)?;
        let oriented = apply_orientation(pixels, record.orient);
        let mut thumb = FastResizer::new().thumbnail(&oriented, self.max_size)?;
        if let Some(date) = &record.date_taken {
            stamp_date(&mut thumb, date);
        }

        let encode_error = |reason: String| ImagingError::EncodeError {
            path: record.thumb.clone(),
            reason,
        };
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(thumb)
            .write_with_encoder(JpegEncoder::new_with_quality(&mut bytes, self.quality))
            .map_err(|e| encode_error(e.to_string()))?;

        let io_error = |source: std::io::Error| ImagingError::IoError {
            path: record.thumb.clone(),
            source,
        };
        if let Some(parent) = record.thumb.parent() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        fs::write(&record.thumb, bytes).map_err(io_error)?;
        debug!(thumb = %record.thumb.display(), "Thumbnail written");
        Ok(())
    }
}
