//! # pixfolio
//!
//! A file-based photo library whose only source of truth is the metadata
//! embedded in the picture files.
//!
//! ## Core Philosophy
//! - **Files are authoritative** - `info.json` and thumbnails are caches
//!   that can be deleted and rebuilt at any time
//! - **Never lose a picture** - deletion means moving to `Trash/`
//! - **Edit in place** - capture dates and orientation live in the file
//!
//! ## Architecture
//! - `core` - Metadata codec, record store, reconciliation, integrity ops
//! - `events` - Event-driven progress reporting (GUI-ready)
//! - `error` - Typed error taxonomy

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use crate::core::{Library, LibraryBuilder, LibraryConfig, PictureRecord};
pub use error::{LibraryError, Result};

/// Initialize tracing for the library
///
/// This should be called by the application entry point (CLI or GUI).
/// `RUST_LOG` selects the level; the default is `warn`.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
    if installed.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}
