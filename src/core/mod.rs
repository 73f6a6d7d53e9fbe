//! # Core Module
//!
//! The GUI-agnostic library engine.
//!
//! ## Modules
//! - `scanner` - Lists the picture files of one folder
//! - `record` - In-memory metadata of one picture
//! - `codec` - Reads and writes metadata embedded in picture files
//! - `store` - Key-to-record cache persisted as `info.json`
//! - `imaging` - Decoding, orienting, resizing and date stamping pixels
//! - `thumbs` - Thumbnail generation
//! - `batch` - Fork-join worker pool over contiguous ranges
//! - `reconcile` - Merges a folder's files with the store
//! - `integrity` - Dedup, renaming, uniqueness, trash and cache cleanup
//! - `library` - Configuration, layout and the operations collaborators call

pub mod batch;
pub mod codec;
pub mod imaging;
pub mod integrity;
pub mod library;
pub mod reconcile;
pub mod record;
pub mod scanner;
pub mod store;
pub mod thumbs;

// Re-export commonly used types
pub use library::{Library, LibraryBuilder, LibraryConfig};
pub use record::{Orientation, PictureRecord};
pub use reconcile::Reconciliation;
pub use store::RecordStore;
