//! # Reconcile Module
//!
//! Merges the files of one library folder with the record store.
//!
//! ## Passes
//! 1. **List**: the folder's picture files, flat, links followed
//! 2. **Pre-pass** (sequential): a cached record whose modification time
//!    matches the file and whose thumbnail exists is used as-is
//! 3. **Workers** (parallel, contiguous ranges): every other file is either
//!    taken from the store when its thumbnail is at least as new as the
//!    file, or decoded from scratch; the result goes back into the store and
//!    the thumbnail is rebuilt if stale
//! 4. **Collect**: failed files are dropped and the rest sorted by capture
//!    date
//!
//! Saving the store afterwards is the caller's business.

use crate::core::batch::BatchPool;
use crate::core::codec;
use crate::core::integrity::names;
use crate::core::record::{sort_by_date, PictureRecord, PixelSize};
use crate::core::scanner::{split_ext, FolderEntry, FolderLister};
use crate::core::store::RecordStore;
use crate::core::thumbs::{self, ThumbnailGenerator};
use crate::error::{CodecError, ScanError};
use crate::events::{BatchKind, Event, EventSender, ProgressMonitor, ReconcileEvent};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info, warn};

/// What a reconciliation needs from the library
pub struct ReconcileContext<'a> {
    /// Where the listed names really live: `All/` for albums, the folder
    /// itself for the trash
    pub file_dir: &'a Path,
    pub thumb_dir: &'a Path,
    pub store: &'a RecordStore,
    pub thumbs: &'a ThumbnailGenerator,
    pub pool: BatchPool,
    pub events: &'a EventSender,
}

/// Outcome of reconciling one folder
#[derive(Debug, Default)]
pub struct Reconciliation {
    /// Records of the folder's pictures, ascending by capture date
    pub records: Vec<PictureRecord>,
    /// Thumbnail path of each record, same order
    pub thumbs: Vec<PathBuf>,
    /// Files whose metadata was decoded in this pass
    pub decoded: usize,
    /// Thumbnails built in this pass
    pub thumbnails_generated: usize,
}

/// Per-file work slot; each worker writes only its own range of these
struct Slot {
    entry: FolderEntry,
    record: Option<PictureRecord>,
    pending: bool,
    decoded: bool,
    thumb_built: bool,
}

/// Reconcile `folder` against the store
pub fn reconcile_folder(
    ctx: &ReconcileContext<'_>,
    folder: &Path,
) -> Result<Reconciliation, ScanError> {
    let listing = FolderLister::new().list(folder)?;
    for error in &listing.errors {
        ctx.events.send(Event::Reconcile(ReconcileEvent::FileSkipped {
            path: folder.to_path_buf(),
            message: error.to_string(),
        }));
    }

    ctx.events.send(Event::Reconcile(ReconcileEvent::Started {
        folder: folder.to_path_buf(),
        total_files: listing.entries.len(),
    }));

    let mut slots: Vec<Slot> = listing
        .entries
        .into_iter()
        .map(|entry| Slot {
            entry,
            record: None,
            pending: true,
            decoded: false,
            thumb_built: false,
        })
        .collect();

    for slot in &mut slots {
        if let Some(cached) = ctx.store.get(&slot.entry.base) {
            if cached.ext == slot.entry.ext
                && cached.is_fresh_for(slot.entry.modified)
                && cached.thumb.exists()
            {
                slot.record = Some(cached);
                slot.pending = false;
            }
        }
    }

    let (mut work, mut slots): (Vec<Slot>, Vec<Slot>) =
        slots.into_iter().partition(|slot| slot.pending);
    debug!(
        folder = %folder.display(),
        cached = slots.len(),
        pending = work.len(),
        "Pre-pass done"
    );

    let progress = ProgressMonitor::new(BatchKind::Reconcile, work.len(), ctx.events.clone());
    ctx.pool.for_each_partitioned(&mut work, |_, slot| {
        process(ctx, slot);
        progress.step();
    });
    slots.append(&mut work);

    let decoded = slots.iter().filter(|s| s.decoded).count();
    let thumbnails_generated = slots.iter().filter(|s| s.thumb_built).count();
    let mut records: Vec<PictureRecord> = slots.into_iter().filter_map(|s| s.record).collect();
    sort_by_date(&mut records);
    let thumbs = records.iter().map(|r| r.thumb.clone()).collect();

    info!(
        folder = %folder.display(),
        records = records.len(),
        decoded,
        thumbnails_generated,
        "Reconciled folder"
    );
    ctx.events.send(Event::Reconcile(ReconcileEvent::Completed {
        total_records: records.len(),
        decoded,
        thumbnails_generated,
    }));

    Ok(Reconciliation {
        records,
        thumbs,
        decoded,
        thumbnails_generated,
    })
}

fn process(ctx: &ReconcileContext<'_>, slot: &mut Slot) {
    let entry = &slot.entry;
    let key = entry.base.as_str();

    let cached = match ctx.store.get(key) {
        Some(cached) if cached.ext != entry.ext => {
            warn!(
                key,
                cached = %cached.file_name_for(key),
                listed = %entry.name,
                "Two files share a base name, the listed one replaces the cached record"
            );
            None
        }
        other => other,
    };

    let record = match cached {
        Some(mut cached)
            if cached.date_taken.is_some() && !thumbs::is_stale(&cached.file, &cached.thumb) =>
        {
            cached.set_file_mod(entry.modified);
            cached
        }
        _ => match decode_entry(ctx, entry) {
            Ok(record) => {
                slot.decoded = true;
                record
            }
            Err(message) => {
                warn!(path = %entry.path.display(), error = %message, "Skipping unreadable file");
                ctx.events.send(Event::Reconcile(ReconcileEvent::FileSkipped {
                    path: entry.path.clone(),
                    message,
                }));
                return;
            }
        },
    };

    match ctx.thumbs.generate_if_needed(&record) {
        Ok(built) => slot.thumb_built = built,
        Err(e) if !record.thumb.exists() => {
            // a picture that cannot be shown is not part of the folder
            warn!(path = %entry.path.display(), error = %e, "Skipping file without thumbnail");
            if ctx.store.get(key).is_some_and(|r| r.ext == entry.ext) {
                ctx.store.remove(key);
            }
            ctx.events.send(Event::Reconcile(ReconcileEvent::FileSkipped {
                path: entry.path.clone(),
                message: e.to_string(),
            }));
            return;
        }
        Err(e) => {
            warn!(path = %entry.path.display(), error = %e, "Thumbnail failed, keeping the old one");
            ctx.events.send(Event::Reconcile(ReconcileEvent::ThumbnailFailed {
                path: entry.path.clone(),
                message: e.to_string(),
            }));
        }
    }
    ctx.store.insert(key, record.clone());
    slot.record = Some(record);
}

/// Build a record for a listed file from its embedded metadata
fn decode_entry(ctx: &ReconcileContext<'_>, entry: &FolderEntry) -> Result<PictureRecord, String> {
    decode_picture(
        &entry.path,
        &entry.name,
        entry.modified,
        ctx.file_dir,
        ctx.thumb_dir,
    )
    .map_err(|e| e.to_string())
}

/// Decode the picture at `path`, stored as `name` in `file_dir`.
///
/// A missing burst number is taken from a canonical file name and a
/// missing size from the image header.
pub(crate) fn decode_picture(
    path: &Path,
    name: &str,
    modified: SystemTime,
    file_dir: &Path,
    thumb_dir: &Path,
) -> Result<PictureRecord, CodecError> {
    let (base, _) = split_ext(name);
    let mut baseline = PictureRecord::from_file_system(file_dir.join(name), modified);
    baseline.set_derived_paths(base, file_dir, thumb_dir);

    let mut record = codec::read_record(path, &baseline)?;
    if record.number == 0 {
        if let Some(number) = names::burst_number(base) {
            record.number = number;
        }
    }
    if record.size.is_zero() {
        if let Ok((width, height)) = image::image_dimensions(path) {
            record.size = PixelSize::new(width, height);
        }
    }
    Ok(record)
}
