//! Library configuration and directory layout.

use crate::core::batch::default_workers;
use crate::core::store::STORE_FILE_NAME;
use crate::core::thumbs::{DEFAULT_THUMB_QUALITY, DEFAULT_THUMB_SIZE};
use crate::error::LibraryError;
use crate::events::EventSender;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Folder holding every real picture file
pub const ALL_FOLDER: &str = "All";
/// Folder holding soft-deleted pictures
pub const TRASH_FOLDER: &str = "Trash";

/// JPEG quality used when pixels have to be re-encoded
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Default thumbnail directory: the platform cache dir
pub fn default_thumb_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("pixfolio")
        .join("thumbs")
}

/// Tunable settings of a library
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Library root, containing `All/`, `Trash/` and album folders
    pub root: PathBuf,
    pub thumb_dir: PathBuf,
    /// Longest side of thumbnails, in pixels
    pub thumb_max_size: u32,
    pub thumb_quality: u8,
    /// Quality for re-encoded pictures
    pub jpeg_quality: u8,
    /// Worker threads per batch
    pub workers: usize,
}

impl LibraryConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            thumb_dir: default_thumb_dir(),
            thumb_max_size: DEFAULT_THUMB_SIZE,
            thumb_quality: DEFAULT_THUMB_QUALITY,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            workers: default_workers(),
        }
    }

    pub fn validate(&self) -> Result<(), LibraryError> {
        if self.thumb_max_size == 0 {
            return Err(LibraryError::Config("thumbnail size must be positive".into()));
        }
        if !(1..=100).contains(&self.jpeg_quality) || !(1..=100).contains(&self.thumb_quality) {
            return Err(LibraryError::Config("JPEG quality must be in 1..=100".into()));
        }
        Ok(())
    }

    pub fn paths(&self) -> LibraryPaths {
        LibraryPaths::new(&self.root, &self.thumb_dir)
    }
}

/// Resolved directories and files of a library
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryPaths {
    pub root: PathBuf,
    pub all_dir: PathBuf,
    pub trash_dir: PathBuf,
    pub thumb_dir: PathBuf,
    /// Thumbnails of trashed pictures, apart from the live ones
    pub trash_thumb_dir: PathBuf,
    pub store_file: PathBuf,
}

impl LibraryPaths {
    pub fn new(root: &Path, thumb_dir: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            all_dir: root.join(ALL_FOLDER),
            trash_dir: root.join(TRASH_FOLDER),
            thumb_dir: thumb_dir.to_path_buf(),
            trash_thumb_dir: thumb_dir.join(TRASH_FOLDER),
            store_file: root.join(STORE_FILE_NAME),
        }
    }

    /// A folder of the library by name
    pub fn folder(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Create `All/`, `Trash/` and the thumbnail directory if missing
    pub fn ensure_dirs(&self) -> Result<(), LibraryError> {
        for dir in [&self.all_dir, &self.trash_dir, &self.thumb_dir] {
            fs::create_dir_all(dir).map_err(|e| {
                LibraryError::Config(format!("cannot create {}: {}", dir.display(), e))
            })?;
        }
        Ok(())
    }
}

/// Builder for [`super::Library`]
pub struct LibraryBuilder {
    pub(super) config: LibraryConfig,
    pub(super) events: Option<EventSender>,
}

impl LibraryBuilder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            config: LibraryConfig::new(root),
            events: None,
        }
    }

    pub fn from_config(config: LibraryConfig) -> Self {
        Self {
            config,
            events: None,
        }
    }

    /// Where thumbnails are kept
    pub fn thumb_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.thumb_dir = dir.into();
        self
    }

    pub fn thumb_max_size(mut self, size: u32) -> Self {
        self.config.thumb_max_size = size;
        self
    }

    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.config.jpeg_quality = quality;
        self
    }

    /// Worker threads per batch (at least one)
    pub fn workers(mut self, workers: usize) -> Self {
        self.config.workers = workers.max(1);
        self
    }

    /// Channel receiving progress and per-item diagnostics
    pub fn events(mut self, sender: EventSender) -> Self {
        self.events = Some(sender);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_under_root() {
        let paths = LibraryPaths::new(Path::new("/pics"), Path::new("/cache/t"));
        assert_eq!(paths.all_dir, PathBuf::from("/pics/All"));
        assert_eq!(paths.trash_dir, PathBuf::from("/pics/Trash"));
        assert_eq!(paths.store_file, PathBuf::from("/pics/info.json"));
        assert_eq!(paths.folder("Summer"), PathBuf::from("/pics/Summer"));
    }

    #[test]
    fn default_thumbs_live_in_cache_dir() {
        assert!(default_thumb_dir().ends_with("pixfolio/thumbs"));
    }

    #[test]
    fn builder_overrides_defaults() {
        let builder = LibraryBuilder::new("/pics")
            .thumb_dir("/tmp/t")
            .thumb_max_size(128)
            .jpeg_quality(80)
            .workers(0);
        assert_eq!(builder.config.thumb_dir, PathBuf::from("/tmp/t"));
        assert_eq!(builder.config.thumb_max_size, 128);
        assert_eq!(builder.config.jpeg_quality, 80);
        assert_eq!(builder.config.workers, 1);
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let mut config = LibraryConfig::new("/pics");
        assert!(config.validate().is_ok());
        config.jpeg_quality = 0;
        assert!(config.validate().is_err());
        config.jpeg_quality = 90;
        config.thumb_max_size = 0;
        assert!(config.validate().is_err());
    }
}
