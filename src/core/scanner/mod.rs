//! # Scanner Module
//!
//! Lists the picture files of one library folder.
//!
//! Library folders are flat: `All/` holds the real files, album folders hold
//! symbolic links into it. Listing therefore never recurses, and links are
//! followed so album entries report the metadata of the file they point at.
//!
//! ## Supported Formats
//! - JPEG (.jpg, .jpeg) - metadata can be read and rewritten
//! - HEIC (.heic, .heif), PNG, WebP, TIFF - metadata is read-only
//! - GIF, BMP - pixels only

mod filter;
mod walker;

pub use filter::ImageFilter;
pub use walker::{FolderLister, FolderListing};
pub(crate) use walker::sub_folders;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// One file found in a library folder
#[derive(Debug, Clone)]
pub struct FolderEntry {
    /// Path as listed (may be a link inside an album folder)
    pub path: PathBuf,
    /// File name including extension
    pub name: String,
    /// File name without extension; the record store key
    pub base: String,
    /// Extension including the leading dot, as written on disk
    pub ext: String,
    /// Size of the target file in bytes
    pub size: u64,
    /// Modification time of the target file
    pub modified: SystemTime,
    /// Detected image format
    pub format: ImageFormat,
}

/// Supported image formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ImageFormat {
    Jpeg,
    Png,
    WebP,
    Heic,
    Gif,
    Bmp,
    Tiff,
    #[default]
    Unknown,
}

impl ImageFormat {
    /// Detect format from file extension (without the dot)
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" => ImageFormat::Jpeg,
            "png" => ImageFormat::Png,
            "webp" => ImageFormat::WebP,
            "heic" | "heif" => ImageFormat::Heic,
            "gif" => ImageFormat::Gif,
            "bmp" => ImageFormat::Bmp,
            "tiff" | "tif" => ImageFormat::Tiff,
            _ => ImageFormat::Unknown,
        }
    }

    /// Detect format from a path's extension
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map(ImageFormat::from_extension)
            .unwrap_or(ImageFormat::Unknown)
    }

    /// Check if this format is supported
    pub fn is_supported(&self) -> bool {
        !matches!(self, ImageFormat::Unknown)
    }

    /// Whether embedded metadata can be written back into this container
    pub fn has_metadata_layout(&self) -> bool {
        matches!(self, ImageFormat::Jpeg)
    }
}

/// Split a file name into base name and extension (with the dot).
///
/// Only the last extension is removed: `a.tar.gz` gives `("a.tar", ".gz")`.
pub fn split_ext(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(0) | None => (name, ""),
        Some(idx) => name.split_at(idx),
    }
}

/// Base name (file name without extension) of a path
pub fn base_name(path: &Path) -> String {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    split_ext(name).0.to_string()
}
