//! Byte-identical duplicate detection.
//!
//! Candidates are bucketed by file size, then by a hash of their first
//! bytes; only files agreeing on both are compared in full.

use super::bytes::{prefix_hash, read_file_bytes, FileBytes};
use super::trash::trash_files;
use super::{DedupReport, DuplicatePair, IntegrityContext};
use crate::error::LibraryError;
use crate::events::{BatchKind, Event, IntegrityEvent, ProgressMonitor};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
struct Candidate {
    key: String,
    name: String,
    file: PathBuf,
    number: u32,
}

/// Find byte-identical pictures and move the extra copies to `Trash/`.
///
/// Of two identical files the one with the smaller burst number is kept,
/// ties going to the smaller key. With `dry_run` nothing is moved.
pub fn clean_duplicates(
    ctx: &IntegrityContext<'_>,
    dry_run: bool,
) -> Result<DedupReport, LibraryError> {
    let mut by_size: HashMap<u64, Vec<Candidate>> = HashMap::new();
    for (key, record) in ctx.store.snapshot() {
        let Ok(meta) = fs::metadata(&record.file) else {
            debug!(key = %key, "Skipping record without a file");
            continue;
        };
        by_size.entry(meta.len()).or_default().push(Candidate {
            name: record.file_name_for(&key),
            key,
            file: record.file,
            number: record.number,
        });
    }

    let mut buckets: Vec<Vec<Candidate>> = by_size
        .into_values()
        .filter(|bucket| bucket.len() > 1)
        .collect();
    buckets.sort_by(|a, b| a[0].key.cmp(&b[0].key));

    let progress = ProgressMonitor::new(BatchKind::Duplicates, buckets.len(), ctx.events.clone());
    let found: Vec<Vec<DuplicatePair>> = ctx.pool.map_partitioned(&buckets, |_, bucket| {
        let pairs = pairs_in_bucket(bucket);
        progress.step();
        pairs
    });

    let mut report = DedupReport {
        buckets: buckets.len(),
        dry_run,
        ..Default::default()
    };
    let names: HashMap<&str, &str> = buckets
        .iter()
        .flatten()
        .map(|c| (c.key.as_str(), c.name.as_str()))
        .collect();

    let mut to_trash = Vec::new();
    for pair in found.into_iter().flatten() {
        ctx.events.send(Event::Integrity(IntegrityEvent::DuplicateFound {
            kept: pair.kept.clone(),
            removed: pair.removed.clone(),
        }));
        if let Some(name) = names.get(pair.removed.as_str()) {
            to_trash.push(name.to_string());
        }
        report.pairs.push(pair);
    }

    if !dry_run && !to_trash.is_empty() {
        let trashed = trash_files(ctx, &to_trash);
        report.errors = trashed.errors;
    }

    info!(
        buckets = report.buckets,
        duplicates = report.pairs.len(),
        dry_run,
        "Duplicate scan finished"
    );
    Ok(report)
}

/// Identical pairs among same-sized files; each file is removed at most once
fn pairs_in_bucket(bucket: &[Candidate]) -> Vec<DuplicatePair> {
    let mut by_prefix: HashMap<u64, Vec<&Candidate>> = HashMap::new();
    for candidate in bucket {
        match prefix_hash(&candidate.file) {
            Some(hash) => by_prefix.entry(hash).or_default().push(candidate),
            None => warn!(file = %candidate.file.display(), "Could not read file prefix"),
        }
    }

    let mut pairs = Vec::new();
    for mut group in by_prefix.into_values().filter(|g| g.len() > 1) {
        group.sort_by(|a, b| (a.number, &a.key).cmp(&(b.number, &b.key)));
        let contents: Vec<Option<FileBytes>> = group
            .iter()
            .map(|c| match read_file_bytes(&c.file) {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    warn!(error = %e, "Could not read file for comparison");
                    None
                }
            })
            .collect();

        let mut removed = vec![false; group.len()];
        for i in 0..group.len() {
            let Some(kept) = contents[i].as_deref() else {
                continue;
            };
            if removed[i] {
                continue;
            }
            for j in (i + 1)..group.len() {
                if removed[j] {
                    continue;
                }
                if contents[j].as_deref() == Some(kept) {
                    removed[j] = true;
                    pairs.push(DuplicatePair {
                        kept: group[i].key.clone(),
                        removed: group[j].key.clone(),
                    });
                }
            }
        }
    }
    pairs.sort_by(|a, b| a.removed.cmp(&b.removed));
    pairs
}
