//! Album folders: symbolic links into `All/`, named like their target.

use crate::core::library::{LibraryPaths, ALL_FOLDER, TRASH_FOLDER};
use crate::core::scanner::sub_folders;
use crate::error::IntegrityError;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

fn io_error(path: &Path, source: io::Error) -> IntegrityError {
    IntegrityError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Relative target of an album link: `../All/<name>`
pub fn link_target(name: &str) -> PathBuf {
    Path::new("..").join(ALL_FOLDER).join(name)
}

#[cfg(unix)]
fn make_link(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn make_link(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}

fn is_link(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(false)
}

/// Album folder names: every sub-folder except `All`, `Trash` and one
/// holding the thumbnail cache
pub fn albums(paths: &LibraryPaths) -> Vec<String> {
    sub_folders(&paths.root)
        .into_iter()
        .filter(|name| name != ALL_FOLDER && name != TRASH_FOLDER)
        .filter(|name| !paths.thumb_dir.starts_with(paths.folder(name)))
        .collect()
}

/// Albums that hold a link called `name`
pub fn albums_containing(paths: &LibraryPaths, name: &str) -> Vec<String> {
    albums(paths)
        .into_iter()
        .filter(|album| is_link(&paths.folder(album).join(name)))
        .collect()
}

/// Link the `All/` files `names` into `album`, creating it if needed.
///
/// Names already present in the album are left alone. Returns the number
/// of links created.
pub fn link_to_album(
    paths: &LibraryPaths,
    album: &str,
    names: &[String],
) -> Result<usize, IntegrityError> {
    let dir = paths.folder(album);
    fs::create_dir_all(&dir).map_err(|e| io_error(&dir, e))?;

    let mut created = 0;
    for name in names {
        let link = dir.join(name);
        if fs::symlink_metadata(&link).is_ok() {
            debug!(album, name = %name, "Already linked");
            continue;
        }
        make_link(&link_target(name), &link).map_err(|e| io_error(&link, e))?;
        created += 1;
    }
    Ok(created)
}

/// Remove the links `names` from `album`; real files are never touched
pub fn unlink_from_album(
    paths: &LibraryPaths,
    album: &str,
    names: &[String],
) -> Result<usize, IntegrityError> {
    let dir = paths.folder(album);
    let mut removed = 0;
    for name in names {
        let link = dir.join(name);
        if is_link(&link) {
            fs::remove_file(&link).map_err(|e| io_error(&link, e))?;
            removed += 1;
        }
    }
    Ok(removed)
}

/// Point every album link called `old` at `All/<new>` under the new name
pub fn retarget_links(paths: &LibraryPaths, old: &str, new: &str) -> Result<usize, IntegrityError> {
    let mut count = 0;
    for album in albums_containing(paths, old) {
        let dir = paths.folder(&album);
        let old_link = dir.join(old);
        let new_link = dir.join(new);
        fs::remove_file(&old_link).map_err(|e| io_error(&old_link, e))?;
        make_link(&link_target(new), &new_link).map_err(|e| io_error(&new_link, e))?;
        count += 1;
    }
    Ok(count)
}

/// Remove links to any of `names` from every album.
///
/// Failures are logged and skipped; returns the number removed.
pub fn strip_links(paths: &LibraryPaths, names: &HashSet<String>) -> usize {
    let mut removed = 0;
    for album in albums(paths) {
        let dir = paths.folder(&album);
        for name in names {
            let link = dir.join(name);
            if !is_link(&link) {
                continue;
            }
            match fs::remove_file(&link) {
                Ok(()) => removed += 1,
                Err(e) => warn!(link = %link.display(), error = %e, "Could not remove album link"),
            }
        }
    }
    removed
}
