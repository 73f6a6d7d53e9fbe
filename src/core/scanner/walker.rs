//! Flat folder listing using walkdir.

use super::{filter::ImageFilter, split_ext, FolderEntry};
use crate::error::ScanError;
use std::path::Path;
use std::time::SystemTime;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Result of listing one folder
#[derive(Debug, Default)]
pub struct FolderListing {
    /// Picture files, sorted by name
    pub entries: Vec<FolderEntry>,
    /// Entries that could not be inspected (e.g. broken links); non-fatal
    pub errors: Vec<ScanError>,
}

/// Lists the files directly inside one folder
pub struct FolderLister {
    filter: ImageFilter,
}

impl FolderLister {
    /// Lister that keeps only supported image files
    pub fn new() -> Self {
        Self {
            filter: ImageFilter::new(),
        }
    }

    /// Lister that keeps every visible regular file
    pub fn any_file() -> Self {
        Self {
            filter: ImageFilter::new().with_any_file(true),
        }
    }

    /// List a folder.
    ///
    /// Fails only when the folder itself cannot be read; problems with
    /// individual entries are collected in [`FolderListing::errors`].
    pub fn list(&self, dir: &Path) -> Result<FolderListing, ScanError> {
        if !dir.is_dir() {
            return Err(ScanError::DirectoryNotFound {
                path: dir.to_path_buf(),
            });
        }

        let mut listing = FolderListing::default();
        let walker = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name();

        for entry_result in walker {
            let entry = match entry_result {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                    let permission_denied = e.io_error().map(|io| io.kind())
                        == Some(std::io::ErrorKind::PermissionDenied);
                    if e.depth() == 0 {
                        return Err(if permission_denied {
                            ScanError::PermissionDenied {
                                path: dir.to_path_buf(),
                            }
                        } else {
                            ScanError::ReadDirectory {
                                path: dir.to_path_buf(),
                                source: e.into(),
                            }
                        });
                    }
                    warn!(path = %path.display(), error = %e, "skipping unreadable entry");
                    listing.errors.push(if permission_denied {
                        ScanError::PermissionDenied { path }
                    } else {
                        ScanError::ReadDirectory {
                            path,
                            source: e.into(),
                        }
                    });
                    continue;
                }
            };

            if !entry.file_type().is_file() || !self.filter.should_include(entry.path()) {
                continue;
            }

            let Some(name) = entry.file_name().to_str().map(String::from) else {
                debug!(path = %entry.path().display(), "skipping non UTF-8 file name");
                continue;
            };

            match entry.metadata() {
                Ok(metadata) => {
                    let (base, ext) = split_ext(&name);
                    listing.entries.push(FolderEntry {
                        path: entry.path().to_path_buf(),
                        base: base.to_string(),
                        ext: ext.to_string(),
                        size: metadata.len(),
                        modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
                        format: self.filter.get_format(entry.path()),
                        name,
                    });
                }
                Err(e) => {
                    listing.errors.push(ScanError::ReadDirectory {
                        path: entry.path().to_path_buf(),
                        source: e.into(),
                    });
                }
            }
        }

        Ok(listing)
    }
}

impl Default for FolderLister {
    fn default() -> Self {
        Self::new()
    }
}

/// Names of the sub-folders of `root`, sorted
pub(crate) fn sub_folders(root: &Path) -> Vec<String> {
    let mut folders: Vec<String> = WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir())
        .filter_map(|e| e.file_name().to_str().map(String::from))
        .filter(|name| !name.starts_with('.'))
        .collect();
    folders.sort();
    folders
}
