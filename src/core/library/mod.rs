//! # Library Module
//!
//! The entry point for collaborators: opens a library root, owns the record
//! store, and exposes reconciliation, integrity operations and edits.
//!
//! ## Layout
//! ```text
//! <root>/All/        every real picture file
//! <root>/Trash/      soft-deleted pictures
//! <root>/<album>/    symbolic links to ../All/<name>
//! <root>/info.json   record cache (+ info.json~ backup)
//! ```
//!
//! ## Example
//! ```rust,ignore
//! let library = Library::builder("/home/me/Pictures/lib").open()?;
//! let pass = library.reconcile("All")?;
//! println!("{} pictures", pass.records.len());
//! library.wait_for_save();
//! ```

mod config;
mod edit;

pub use config::{
    default_thumb_dir, LibraryBuilder, LibraryConfig, LibraryPaths, ALL_FOLDER,
    DEFAULT_JPEG_QUALITY, TRASH_FOLDER,
};

use crate::core::batch::BatchPool;
use crate::core::integrity::{
    self, links, CleanupReport, DedupReport, IntegrityContext, RenameReport, TrashReport,
};
use crate::core::reconcile::{reconcile_folder, ReconcileContext, Reconciliation};
use crate::core::record::PictureRecord;
use crate::core::store::RecordStore;
use crate::core::thumbs::ThumbnailGenerator;
use crate::error::{LibraryError, Result, StoreError};
use crate::events::{null_sender, EventSender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use tracing::{debug, info, warn};

/// An open picture library
pub struct Library {
    config: LibraryConfig,
    paths: LibraryPaths,
    store: Arc<RecordStore>,
    /// Records of `Trash/`, kept for this session only
    trash_store: RecordStore,
    thumbs: ThumbnailGenerator,
    pool: BatchPool,
    events: EventSender,
    save_handle: Mutex<Option<JoinHandle<()>>>,
}

impl LibraryBuilder {
    /// Create the library folders if needed and load the record cache.
    ///
    /// A corrupt cache is set aside: the library starts cold and rebuilds
    /// it from the files on the next reconciliation.
    pub fn open(self) -> Result<Library> {
        self.config.validate()?;
        let paths = self.config.paths();
        paths.ensure_dirs()?;

        let store = match RecordStore::load(&paths.store_file) {
            Ok(store) => store,
            Err(e @ StoreError::Corrupted { .. }) => {
                warn!(error = %e, "Ignoring unreadable record cache");
                RecordStore::new()
            }
            Err(e) => return Err(e.into()),
        };
        store.set_derived_paths(&paths.all_dir, &paths.thumb_dir);
        info!(
            root = %paths.root.display(),
            records = store.len(),
            "Opened library"
        );

        Ok(Library {
            thumbs: ThumbnailGenerator::new(self.config.thumb_max_size, self.config.thumb_quality),
            pool: BatchPool::new(self.config.workers),
            events: self.events.unwrap_or_else(null_sender),
            store: Arc::new(store),
            trash_store: RecordStore::new(),
            save_handle: Mutex::new(None),
            config: self.config,
            paths,
        })
    }
}

impl Library {
    pub fn builder(root: impl Into<std::path::PathBuf>) -> LibraryBuilder {
        LibraryBuilder::new(root)
    }

    pub fn config(&self) -> &LibraryConfig {
        &self.config
    }

    pub fn paths(&self) -> &LibraryPaths {
        &self.paths
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Cached record of a picture
    pub fn record(&self, key: &str) -> Option<PictureRecord> {
        self.store.get(key)
    }

    /// Reconcile one folder (`All`, `Trash` or an album) with the store.
    ///
    /// The store is saved in the background afterwards. Trashed pictures
    /// are kept out of the store and out of `info.json`: their records point
    /// into `Trash/` and their thumbnails live in their own directory.
    pub fn reconcile(&self, folder: &str) -> Result<Reconciliation> {
        if folder == TRASH_FOLDER {
            let ctx = ReconcileContext {
                file_dir: &self.paths.trash_dir,
                thumb_dir: &self.paths.trash_thumb_dir,
                store: &self.trash_store,
                thumbs: &self.thumbs,
                pool: self.pool,
                events: &self.events,
            };
            return Ok(reconcile_folder(&ctx, &self.paths.trash_dir)?);
        }

        let ctx = ReconcileContext {
            file_dir: &self.paths.all_dir,
            thumb_dir: &self.paths.thumb_dir,
            store: &self.store,
            thumbs: &self.thumbs,
            pool: self.pool,
            events: &self.events,
        };
        let result = reconcile_folder(&ctx, &self.paths.folder(folder))?;
        self.spawn_save();
        Ok(result)
    }

    /// Block until the last background save has finished
    pub fn wait_for_save(&self) {
        let handle = self
            .save_handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                warn!("Record cache save thread panicked");
            }
        }
    }

    fn spawn_save(&self) {
        // one save at a time so the backup rotation stays ordered
        self.wait_for_save();
        let store = Arc::clone(&self.store);
        let file = self.paths.store_file.clone();
        let spawned = std::thread::Builder::new()
            .name("pixfolio-save".into())
            .spawn(move || match store.save(&file) {
                Ok(()) => debug!(file = %file.display(), "Record cache saved"),
                Err(e) => warn!(error = %e, "Could not save record cache"),
            });
        match spawned {
            Ok(handle) => {
                *self
                    .save_handle
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner) = Some(handle);
            }
            Err(e) => {
                warn!(error = %e, "Could not start save thread, saving inline");
                if let Err(e) = self.store.save(&self.paths.store_file) {
                    warn!(error = %e, "Could not save record cache");
                }
            }
        }
    }

    fn integrity(&self) -> IntegrityContext<'_> {
        IntegrityContext {
            paths: &self.paths,
            store: &self.store,
            pool: self.pool,
            events: &self.events,
        }
    }

    fn refresh_all(&self) -> Result<()> {
        self.reconcile(ALL_FOLDER).map(|_| ())
    }

    /// Album folder names
    pub fn albums(&self) -> Vec<String> {
        links::albums(&self.paths)
    }

    /// Link `All/` files into an album, creating it if needed
    pub fn link_to_album(&self, album: &str, names: &[String]) -> Result<usize> {
        check_album(album)?;
        Ok(links::link_to_album(&self.paths, album, names)?)
    }

    /// Remove links from an album; the files stay in `All/`
    pub fn unlink_from_album(&self, album: &str, names: &[String]) -> Result<usize> {
        check_album(album)?;
        Ok(links::unlink_from_album(&self.paths, album, names)?)
    }

    /// Move `All/` files to the trash
    pub fn trash_files(&self, names: &[String]) -> Result<TrashReport> {
        let report = integrity::trash_files(&self.integrity(), names);
        self.refresh_all()?;
        Ok(report)
    }

    /// Move files from the trash back to `All/`
    pub fn untrash_files(&self, names: &[String]) -> Result<TrashReport> {
        let report = integrity::untrash_files(&self.integrity(), names);
        self.refresh_all()?;
        Ok(report)
    }

    /// Rename every picture to `img_<yymmdd_HHMMSS>_n<N>`
    pub fn rename_by_date(&self) -> Result<RenameReport> {
        let report = integrity::rename_by_date(&self.integrity())?;
        self.refresh_all()?;
        Ok(report)
    }

    /// Give every file in `All/` a distinct base name
    pub fn uniquify_base_names(&self) -> Result<RenameReport> {
        let report = integrity::uniquify_base_names(&self.integrity())?;
        self.refresh_all()?;
        Ok(report)
    }

    /// Move byte-identical copies to the trash (or only report them)
    pub fn clean_duplicates(&self, dry_run: bool) -> Result<DedupReport> {
        let report = integrity::clean_duplicates(&self.integrity(), dry_run)?;
        if !dry_run {
            self.refresh_all()?;
        }
        Ok(report)
    }

    /// Drop cached records whose files are gone (or only report them)
    pub fn clean_cache(&self, dry_run: bool) -> Result<CleanupReport> {
        let report = integrity::clean_cache(&self.integrity(), dry_run);
        if !dry_run {
            self.refresh_all()?;
        }
        Ok(report)
    }
}

impl Drop for Library {
    fn drop(&mut self) {
        self.wait_for_save();
    }
}

fn check_album(album: &str) -> Result<()> {
    if album.is_empty()
        || album == ALL_FOLDER
        || album == TRASH_FOLDER
        || album.contains(['/', '\\'])
        || album.starts_with('.')
    {
        return Err(LibraryError::Config(format!("'{}' is not an album name", album)));
    }
    Ok(())
}
