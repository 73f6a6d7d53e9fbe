//! File filtering logic for folder listings.

use super::ImageFormat;
use std::collections::HashSet;
use std::path::Path;

/// Decides which directory entries count as pictures
pub struct ImageFilter {
    /// File extensions to include (lowercase, no dot)
    extensions: HashSet<String>,
    /// Whether to include hidden files
    include_hidden: bool,
    /// Accept every regular file regardless of extension
    any_file: bool,
}

impl ImageFilter {
    /// Create a new filter with default supported extensions
    pub fn new() -> Self {
        Self {
            extensions: [
                "jpg", "jpeg", "png", "webp", "heic", "heif", "gif", "bmp", "tiff", "tif",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            include_hidden: false,
            any_file: false,
        }
    }

    /// Include hidden files (starting with .)
    pub fn with_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    /// Accept files of any type, e.g. when checking name uniqueness
    pub fn with_any_file(mut self, any: bool) -> Self {
        self.any_file = any;
        self
    }

    /// Check if a file should be included
    pub fn should_include(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        if !self.include_hidden && name.starts_with('.') {
            return false;
        }
        if self.any_file {
            return true;
        }

        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| self.extensions.contains(&ext.to_lowercase()))
            .unwrap_or(false)
    }

    /// Get the image format for a path
    pub fn get_format(&self, path: &Path) -> ImageFormat {
        ImageFormat::from_path(path)
    }
}

impl Default for ImageFilter {
    fn default() -> Self {
        Self::new()
    }
}
