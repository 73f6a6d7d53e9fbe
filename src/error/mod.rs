//! # Error Module
//!
//! Error types for the picture library.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - paths, keys, what went wrong
//! - **Files are authoritative** - cache-layer failures are recoverable by a rescan
//!
//! ## Failure Classes
//! - A single file that cannot be read or decoded is skipped and reported
//!   through the event channel; the batch continues.
//! - A folder that cannot be listed aborts the call with a [`ScanError`].
//! - A container without a modeled metadata layout is saved pixel-only and
//!   logged, never returned as an error.
//! - Rename collisions are resolved by numeric suffixes, never returned.
//! - A failed `info.json` save is logged; in-memory state stays intact.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level library error
#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("Scanning error: {0}")]
    Scan(#[from] ScanError),

    #[error("Metadata error: {0}")]
    Codec(#[from] CodecError),

    #[error("Record store error: {0}")]
    Store(#[from] StoreError),

    #[error("Image error: {0}")]
    Imaging(#[from] ImagingError),

    #[error("Integrity error: {0}")]
    Integrity(#[from] IntegrityError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors that occur while listing a folder
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Permission denied accessing: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Failed to read directory {path}: {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from reading or writing embedded metadata
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed container: {reason}")]
    MalformedContainer { reason: String },

    #[error("Metadata segment of {len} bytes does not fit in a JPEG segment")]
    SegmentTooLarge { len: usize },

    #[error("Failed to encode metadata: {0}")]
    Encode(String),
}

/// Errors with the info.json record cache
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to access record cache {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Record cache corruption detected at {path}: {reason}. Delete this file and rescan.")]
    Corrupted { path: PathBuf, reason: String },

    #[error("Failed to serialize records: {0}")]
    SerializationFailed(String),
}

/// Errors from decoding, transforming, or encoding pixels
#[derive(Error, Debug)]
pub enum ImagingError {
    #[error("Unsupported image format for {path}")]
    UnsupportedFormat { path: PathBuf },

    #[error("Failed to decode image {path}: {reason}")]
    DecodeError { path: PathBuf, reason: String },

    #[error("Failed to encode image {path}: {reason}")]
    EncodeError { path: PathBuf, reason: String },

    #[error("Failed to access image file {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from file-level library operations
#[derive(Error, Debug)]
pub enum IntegrityError {
    #[error("No record for picture '{key}'")]
    RecordNotFound { key: String },

    #[error("Unsupported rotation of {degrees} degrees (use 90, -90 or 180)")]
    InvalidRotation { degrees: i32 },

    #[error("Picture '{key}' has no capture date")]
    MissingDate { key: String },

    #[error("File operation failed on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, LibraryError>;
