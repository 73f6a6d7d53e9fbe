//! Reports returned by integrity operations.

use serde::{Deserialize, Serialize};

/// Outcome of a renaming pass
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenameReport {
    /// (old file name, new file name)
    pub renamed: Vec<(String, String)>,
    /// Files that already had the right name
    pub unchanged: usize,
    pub errors: Vec<String>,
}

/// A byte-identical pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicatePair {
    /// Store key of the file kept in `All/`
    pub kept: String,
    /// Store key of the file moved to `Trash/`
    pub removed: String,
}

/// Outcome of duplicate cleaning
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DedupReport {
    pub pairs: Vec<DuplicatePair>,
    /// Size buckets with more than one file
    pub buckets: usize,
    /// Nothing was moved
    pub dry_run: bool,
    pub errors: Vec<String>,
}

/// Outcome of cache cleaning
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleanupReport {
    /// Records whose files were re-read
    pub checked: usize,
    /// Records that differ from their files
    pub mismatched: usize,
    /// Keys whose files are gone (removed unless dry run)
    pub pruned: Vec<String>,
    pub dry_run: bool,
}

/// Outcome of moving files in or out of the trash
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrashReport {
    /// File names moved
    pub moved: Vec<String>,
    /// Album links removed
    pub links_removed: usize,
    pub errors: Vec<String>,
}
