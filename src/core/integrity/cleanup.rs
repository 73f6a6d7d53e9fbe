//! Cache cleanup: re-checking stored records against their files.

use super::{CleanupReport, IntegrityContext};
use crate::core::record::PictureRecord;
use crate::core::reconcile::decode_picture;
use crate::events::{BatchKind, Event, IntegrityEvent, ProgressMonitor};
use std::fs;
use tracing::{debug, info};

enum Check {
    Missing,
    Matches,
    Differs(Vec<String>),
}

/// Re-read every stored picture and drop records whose file is gone.
///
/// Records that disagree with their file are reported as mismatches; the
/// next reconciliation refreshes them. With `dry_run` nothing is removed.
pub fn clean_cache(ctx: &IntegrityContext<'_>, dry_run: bool) -> CleanupReport {
    ctx.store.clear_flags();
    let snapshot = ctx.store.snapshot();
    let paths = ctx.paths;

    let progress =
        ProgressMonitor::new(BatchKind::CacheCleanup, snapshot.len(), ctx.events.clone());
    let checks = ctx.pool.map_partitioned(&snapshot, |_, (key, cached)| {
        let check = check_record(ctx, key, cached);
        progress.step();
        check
    });

    let mut report = CleanupReport {
        dry_run,
        ..Default::default()
    };
    for ((key, _), check) in snapshot.iter().zip(checks) {
        match check {
            Check::Missing => continue,
            Check::Matches => {}
            Check::Differs(differences) => {
                debug!(key = %key, ?differences, "Cached record differs from file");
                ctx.events.send(Event::Integrity(IntegrityEvent::CacheMismatch {
                    key: key.clone(),
                    differences,
                }));
                report.mismatched += 1;
            }
        }
        report.checked += 1;
        ctx.store.flag(key);
    }

    report.pruned = if dry_run {
        ctx.store.unflagged_keys()
    } else {
        ctx.store.retain_flagged()
    };
    for key in &report.pruned {
        ctx.events.send(Event::Integrity(IntegrityEvent::Pruned { key: key.clone() }));
    }

    info!(
        checked = report.checked,
        mismatched = report.mismatched,
        pruned = report.pruned.len(),
        dry_run,
        store = %paths.store_file.display(),
        "Cache cleanup finished"
    );
    report
}

fn check_record(ctx: &IntegrityContext<'_>, key: &str, cached: &PictureRecord) -> Check {
    let Ok(meta) = fs::metadata(&cached.file) else {
        return Check::Missing;
    };
    let Ok(modified) = meta.modified() else {
        return Check::Matches;
    };

    let name = cached.file_name_for(key);
    match decode_picture(
        &cached.file,
        &name,
        modified,
        &ctx.paths.all_dir,
        &ctx.paths.thumb_dir,
    ) {
        Ok(fresh) => {
            let differences = cached.diffs_to(&fresh);
            if differences.is_empty() {
                Check::Matches
            } else {
                Check::Differs(differences)
            }
        }
        Err(e) => Check::Differs(vec![format!("unreadable: {}", e)]),
    }
}
