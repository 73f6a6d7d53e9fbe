//! # Integrity Module
//!
//! File-level operations over `All/`, `Trash/` and album folders that keep
//! files, album links, thumbnails and the record store consistent.
//!
//! ## Operations
//! - **Uniquify**: no two files in `All/` share a base name
//! - **Rename by date**: canonical `img_<yymmdd_HHMMSS>_n<N>` names
//! - **Duplicates**: byte-identical files are moved to `Trash/`
//! - **Cache cleanup**: records whose files are gone are dropped
//! - **Trash**: soft delete and restore
//!
//! Callers re-reconcile `All/` afterwards so every changed file gets a
//! fresh record.

mod bytes;
mod cleanup;
mod dedup;
pub mod links;
pub mod names;
mod rename;
mod trash;
mod types;
mod uniquify;

pub use bytes::{prefix_hash, read_file_bytes, FileBytes};
pub use cleanup::clean_cache;
pub use dedup::clean_duplicates;
pub use rename::rename_by_date;
pub use trash::{trash_files, untrash_files};
pub use types::{CleanupReport, DedupReport, DuplicatePair, RenameReport, TrashReport};
pub use uniquify::uniquify_base_names;

use crate::core::batch::BatchPool;
use crate::core::library::LibraryPaths;
use crate::core::record::thumb_path;
use crate::core::store::RecordStore;
use crate::error::IntegrityError;
use crate::events::{Event, EventSender, IntegrityEvent};
use std::fs;
use std::io;
use tracing::{info, warn};

/// What an integrity operation needs from the library
pub struct IntegrityContext<'a> {
    pub paths: &'a LibraryPaths,
    pub store: &'a RecordStore,
    pub pool: BatchPool,
    pub events: &'a EventSender,
}

impl IntegrityContext<'_> {
    pub(crate) fn report_error(&self, name: &str, message: String) {
        warn!(name, error = %message, "Integrity operation skipped an item");
        self.events.send(Event::Integrity(IntegrityEvent::Error {
            name: name.to_string(),
            message,
        }));
    }
}

/// Rename `All/<old_base><ext>` to `All/<new_base><ext>`.
///
/// Album links follow the file. The store entry and thumbnail move along
/// when the entry describes this very file; a record of a same-named file
/// with another extension is left for the next reconciliation.
pub(crate) fn rename_picture(
    ctx: &IntegrityContext<'_>,
    old_base: &str,
    ext: &str,
    new_base: &str,
) -> Result<(), IntegrityError> {
    let paths = ctx.paths;
    let old_name = format!("{}{}", old_base, ext);
    let new_name = format!("{}{}", new_base, ext);
    let from = paths.all_dir.join(&old_name);
    let to = paths.all_dir.join(&new_name);

    if fs::symlink_metadata(&to).is_ok() {
        return Err(IntegrityError::Io {
            path: to,
            source: io::Error::new(io::ErrorKind::AlreadyExists, "target name is taken"),
        });
    }
    fs::rename(&from, &to).map_err(|source| IntegrityError::Io { path: from, source })?;

    links::retarget_links(paths, &old_name, &new_name)?;

    // a clashing file with another extension owns neither record nor thumbnail
    if ctx.store.get(old_base).is_some_and(|r| r.ext == ext) {
        let old_thumb = thumb_path(&paths.thumb_dir, old_base);
        if old_thumb.exists() {
            let new_thumb = thumb_path(&paths.thumb_dir, new_base);
            if let Err(e) = fs::rename(&old_thumb, &new_thumb) {
                warn!(thumb = %old_thumb.display(), error = %e, "Could not move thumbnail");
            }
        }
        ctx.store.rekey(old_base, new_base);
        ctx.store.update(new_base, |record| {
            record.set_derived_paths(new_base, &paths.all_dir, &paths.thumb_dir)
        });
    }

    info!(from = %old_name, to = %new_name, "Renamed picture");
    ctx.events.send(Event::Integrity(IntegrityEvent::Renamed {
        from: old_name,
        to: new_name,
    }));
    Ok(())
}
