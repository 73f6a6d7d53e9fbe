//! Event type definitions for progress reporting.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted by the library
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Folder reconciliation events
    Reconcile(ReconcileEvent),
    /// File-level integrity operation events
    Integrity(IntegrityEvent),
    /// Coarse progress of a running batch
    Progress(BatchProgress),
}

/// Events during a folder reconciliation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ReconcileEvent {
    /// Reconciliation has started
    Started { folder: PathBuf, total_files: usize },
    /// A file could not be read and was dropped from this pass
    FileSkipped { path: PathBuf, message: String },
    /// A thumbnail could not be produced (the record is still listed)
    ThumbnailFailed { path: PathBuf, message: String },
    /// Reconciliation completed
    Completed {
        total_records: usize,
        decoded: usize,
        thumbnails_generated: usize,
    },
}

/// Events from integrity operations and edits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum IntegrityEvent {
    /// A file in the canonical store was renamed
    Renamed { from: String, to: String },
    /// A file was moved to the trash
    Trashed { name: String },
    /// A file was moved back from the trash
    Restored { name: String },
    /// A byte-identical pair was found
    DuplicateFound { kept: String, removed: String },
    /// A cached record was dropped because its file is gone
    Pruned { key: String },
    /// A cached record differs from what the file now says
    CacheMismatch { key: String, differences: Vec<String> },
    /// An item failed; the operation continues
    Error { name: String, message: String },
}

/// Which kind of batch a progress update belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchKind {
    Reconcile,
    Duplicates,
    CacheCleanup,
}

/// Progress information for a running batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchProgress {
    /// Which batch this is
    pub batch: BatchKind,
    /// Items finished so far
    pub completed: usize,
    /// Total items in the batch
    pub total: usize,
}
