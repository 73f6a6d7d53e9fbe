//! File contents for byte-for-byte comparison.
//!
//! Large files are memory-mapped so comparing them does not copy them
//! through the heap.

use crate::error::IntegrityError;
use memmap2::Mmap;
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;
use xxhash_rust::xxh3::xxh3_64;

/// Files at least this large are memory-mapped
const MMAP_THRESHOLD: u64 = 1024 * 1024;

/// Bytes hashed by the prefix prefilter
const PREFIX_SIZE: usize = 4096;

/// Owned or memory-mapped file contents
pub enum FileBytes {
    Vec(Vec<u8>),
    Mmap(Mmap),
}

impl std::ops::Deref for FileBytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            FileBytes::Vec(v) => v,
            FileBytes::Mmap(m) => m,
        }
    }
}

fn io_error(path: &Path, source: std::io::Error) -> IntegrityError {
    IntegrityError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Read a whole file, mapping it when large
pub fn read_file_bytes(path: &Path) -> Result<FileBytes, IntegrityError> {
    let len = fs::metadata(path).map_err(|e| io_error(path, e))?.len();
    if len < MMAP_THRESHOLD {
        return fs::read(path)
            .map(FileBytes::Vec)
            .map_err(|e| io_error(path, e));
    }

    let file = File::open(path).map_err(|e| io_error(path, e))?;
    // SAFETY: read-only mapping; a concurrent writer can only make the
    // comparison report a difference, which leaves both files in place.
    let map = unsafe { Mmap::map(&file) }.map_err(|e| io_error(path, e))?;
    Ok(FileBytes::Mmap(map))
}

/// xxh3 of the first few KiB of a file
pub fn prefix_hash(path: &Path) -> Option<u64> {
    let mut file = File::open(path).ok()?;
    let mut buffer = [0u8; PREFIX_SIZE];
    let mut filled = 0;
    while filled < PREFIX_SIZE {
        match file.read(&mut buffer[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(_) => return None,
        }
    }
    Some(xxh3_64(&buffer[..filled]))
}
