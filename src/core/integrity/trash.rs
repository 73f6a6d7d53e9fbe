//! Soft delete: moving files between `All/` and `Trash/`.

use super::names::unique_suffixed;
use super::{links, IntegrityContext, TrashReport};
use crate::core::record::thumb_path;
use crate::core::scanner::split_ext;
use crate::events::{Event, IntegrityEvent};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, info, warn};

fn taken_in<'a>(dir: &'a Path, ext: &str) -> impl Fn(&str) -> bool + 'a {
    let ext = ext.to_string();
    move |base: &str| fs::symlink_metadata(dir.join(format!("{}{}", base, ext))).is_ok()
}

/// Delete the thumbnail of `base` in `thumb_dir`, if there is one
fn drop_thumbnail(thumb_dir: &Path, base: &str) {
    let thumb = thumb_path(thumb_dir, base);
    match fs::remove_file(&thumb) {
        Ok(()) => debug!(thumb = %thumb.display(), "Removed thumbnail"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!(thumb = %thumb.display(), error = %e, "Could not remove thumbnail"),
    }
}

/// Move the `All/` files `names` to `Trash/`.
///
/// Album links to them are removed and so are their store entries. A name
/// already present in the trash gets a numeric suffix.
pub fn trash_files(ctx: &IntegrityContext<'_>, names: &[String]) -> TrashReport {
    let paths = ctx.paths;
    let mut report = TrashReport::default();
    let mut moved = HashSet::new();

    for name in names {
        let from = paths.all_dir.join(name);
        if !from.is_file() {
            report.errors.push(format!("{}: not in the library", name));
            ctx.report_error(name, "not in the library".into());
            continue;
        }

        let (base, ext) = split_ext(name);
        let mut target = paths.trash_dir.join(name);
        if fs::symlink_metadata(&target).is_ok() {
            let free = unique_suffixed(base, taken_in(&paths.trash_dir, ext));
            target = paths.trash_dir.join(format!("{}{}", free, ext));
        }

        if let Err(e) = fs::rename(&from, &target) {
            report.errors.push(format!("{}: {}", name, e));
            ctx.report_error(name, e.to_string());
            continue;
        }

        if ctx.store.get(base).is_some_and(|r| r.ext == ext) {
            ctx.store.remove(base);
            drop_thumbnail(&paths.thumb_dir, base);
        }
        // a thumbnail left from an earlier file of the same trash name
        if let Some(trashed) = target.file_stem().and_then(|s| s.to_str()) {
            drop_thumbnail(&paths.trash_thumb_dir, trashed);
        }
        ctx.events.send(Event::Integrity(IntegrityEvent::Trashed { name: name.clone() }));
        moved.insert(name.clone());
        report.moved.push(name.clone());
    }

    report.links_removed = links::strip_links(paths, &moved);
    info!(
        moved = report.moved.len(),
        links_removed = report.links_removed,
        "Moved files to trash"
    );
    report
}

/// Move the `Trash/` files `names` back to `All/`.
///
/// A name already taken in `All/` is reported and the file stays in the
/// trash. Records come back with the next reconciliation of `All/`.
pub fn untrash_files(ctx: &IntegrityContext<'_>, names: &[String]) -> TrashReport {
    let paths = ctx.paths;
    let mut report = TrashReport::default();

    for name in names {
        let from = paths.trash_dir.join(name);
        let to = paths.all_dir.join(name);
        let outcome = if !from.is_file() {
            Err("not in the trash".to_string())
        } else if fs::symlink_metadata(&to).is_ok() {
            Err("a file of that name is already in the library".to_string())
        } else {
            fs::rename(&from, &to).map_err(|e| e.to_string())
        };

        match outcome {
            Ok(()) => {
                drop_thumbnail(&paths.trash_thumb_dir, split_ext(name).0);
                ctx.events.send(Event::Integrity(IntegrityEvent::Restored { name: name.clone() }));
                report.moved.push(name.clone());
            }
            Err(message) => {
                report.errors.push(format!("{}: {}", name, message));
                ctx.report_error(name, message);
            }
        }
    }

    info!(restored = report.moved.len(), "Restored files from trash");
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::batch::BatchPool;
    use crate::core::library::LibraryPaths;
    use crate::core::record::PictureRecord;
    use crate::core::store::RecordStore;
    use crate::events::null_sender;
    use tempfile::TempDir;

    fn library() -> (TempDir, LibraryPaths, RecordStore) {
        let dir = TempDir::new().unwrap();
        let paths = LibraryPaths::new(dir.path(), &dir.path().join("thumbs"));
        paths.ensure_dirs().unwrap();
        let store = RecordStore::new();
        for name in ["a.jpg", "b.jpg"] {
            fs::write(paths.all_dir.join(name), name).unwrap();
            store.insert(split_ext(name).0, PictureRecord::new(paths.all_dir.join(name)));
        }
        (dir, paths, store)
    }

    #[test]
    fn trash_then_untrash_restores_the_file() {
        let (_dir, paths, store) = library();
        let events = null_sender();
        let ctx = IntegrityContext {
            paths: &paths,
            store: &store,
            pool: BatchPool::new(1),
            events: &events,
        };

        let trashed = trash_files(&ctx, &["a.jpg".into()]);
        assert_eq!(trashed.moved, vec!["a.jpg".to_string()]);
        assert!(!paths.all_dir.join("a.jpg").exists());
        assert!(paths.trash_dir.join("a.jpg").exists());
        assert!(!store.contains("a"));
        assert!(store.contains("b"));

        let restored = untrash_files(&ctx, &["a.jpg".into()]);
        assert_eq!(restored.moved, vec!["a.jpg".to_string()]);
        assert_eq!(fs::read(paths.all_dir.join("a.jpg")).unwrap(), b"a.jpg");
        assert!(!paths.trash_dir.join("a.jpg").exists());
    }

    #[test]
    fn trashing_drops_the_thumbnail() {
        let (_dir, paths, store) = library();
        fs::create_dir_all(&paths.thumb_dir).unwrap();
        fs::create_dir_all(&paths.trash_thumb_dir).unwrap();
        for base in ["a", "b"] {
            fs::write(thumb_path(&paths.thumb_dir, base), b"thumb").unwrap();
        }
        fs::write(thumb_path(&paths.trash_thumb_dir, "a"), b"stale").unwrap();
        let events = null_sender();
        let ctx = IntegrityContext {
            paths: &paths,
            store: &store,
            pool: BatchPool::new(1),
            events: &events,
        };

        trash_files(&ctx, &["a.jpg".into()]);
        assert!(!thumb_path(&paths.thumb_dir, "a").exists());
        assert!(!thumb_path(&paths.trash_thumb_dir, "a").exists());
        assert!(thumb_path(&paths.thumb_dir, "b").exists());

        fs::write(thumb_path(&paths.trash_thumb_dir, "a"), b"trashed").unwrap();
        untrash_files(&ctx, &["a.jpg".into()]);
        assert!(!thumb_path(&paths.trash_thumb_dir, "a").exists());
    }

    #[test]
    fn trash_name_collision_gets_a_suffix() {
        let (_dir, paths, store) = library();
        fs::write(paths.trash_dir.join("a.jpg"), b"older").unwrap();
        let events = null_sender();
        let ctx = IntegrityContext {
            paths: &paths,
            store: &store,
            pool: BatchPool::new(1),
            events: &events,
        };

        trash_files(&ctx, &["a.jpg".into()]);
        assert_eq!(fs::read(paths.trash_dir.join("a.jpg")).unwrap(), b"older");
        assert_eq!(fs::read(paths.trash_dir.join("a_1.jpg")).unwrap(), b"a.jpg");
    }

    #[test]
    fn unknown_names_are_reported_not_fatal() {
        let (_dir, paths, store) = library();
        let events = null_sender();
        let ctx = IntegrityContext {
            paths: &paths,
            store: &store,
            pool: BatchPool::new(1),
            events: &events,
        };

        let report = trash_files(&ctx, &["zzz.jpg".into(), "b.jpg".into()]);
        assert_eq!(report.moved, vec!["b.jpg".to_string()]);
        assert_eq!(report.errors.len(), 1);

        fs::write(paths.trash_dir.join("a.jpg"), b"x").unwrap();
        let report = untrash_files(&ctx, &["a.jpg".into()]);
        assert!(report.moved.is_empty());
        assert_eq!(report.errors.len(), 1);
    }
}
