//! Making base names unique within `All/`.

use super::names::unique_suffixed;
use super::{rename_picture, IntegrityContext, RenameReport};
use crate::core::scanner::{FolderEntry, FolderLister};
use crate::error::LibraryError;
use std::collections::{BTreeMap, HashSet};
use tracing::info;

/// Rename files in `All/` so that no two share a base name.
///
/// In each clash the file described by the store keeps its name (or the
/// first by name if none is); the others get the smallest free `_<n>`
/// suffix, checked against every base name in the folder.
pub fn uniquify_base_names(ctx: &IntegrityContext<'_>) -> Result<RenameReport, LibraryError> {
    let listing = FolderLister::any_file().list(&ctx.paths.all_dir)?;
    let mut taken: HashSet<String> = listing.entries.iter().map(|e| e.base.clone()).collect();

    let mut groups: BTreeMap<String, Vec<FolderEntry>> = BTreeMap::new();
    for entry in listing.entries {
        groups.entry(entry.base.clone()).or_default().push(entry);
    }

    let mut report = RenameReport::default();
    for (base, mut group) in groups {
        if group.len() < 2 {
            report.unchanged += group.len();
            continue;
        }

        let keeper = ctx
            .store
            .get(&base)
            .and_then(|record| group.iter().position(|e| e.ext == record.ext))
            .unwrap_or(0);
        group.remove(keeper);
        report.unchanged += 1;

        for entry in group {
            let new_base = unique_suffixed(&base, |name| taken.contains(name));
            match rename_picture(ctx, &base, &entry.ext, &new_base) {
                Ok(()) => {
                    report
                        .renamed
                        .push((entry.name.clone(), format!("{}{}", new_base, entry.ext)));
                    taken.insert(new_base);
                }
                Err(e) => {
                    report.errors.push(format!("{}: {}", entry.name, e));
                    ctx.report_error(&entry.name, e.to_string());
                }
            }
        }
    }

    info!(
        renamed = report.renamed.len(),
        errors = report.errors.len(),
        "Made base names unique"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::batch::BatchPool;
    use crate::core::library::LibraryPaths;
    use crate::core::record::PictureRecord;
    use crate::core::store::RecordStore;
    use crate::events::null_sender;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn clashes_get_the_smallest_free_suffix() {
        let dir = TempDir::new().unwrap();
        let paths = LibraryPaths::new(dir.path(), &dir.path().join("thumbs"));
        paths.ensure_dirs().unwrap();
        for name in ["x.jpg", "x.png", "x.heic", "x_1.jpg", "y.jpg"] {
            fs::write(paths.all_dir.join(name), name).unwrap();
        }
        let store = RecordStore::new();
        store.insert("x", PictureRecord::new(paths.all_dir.join("x.png")));

        let events = null_sender();
        let ctx = IntegrityContext {
            paths: &paths,
            store: &store,
            pool: BatchPool::new(1),
            events: &events,
        };
        let report = uniquify_base_names(&ctx).unwrap();
        assert_eq!(report.renamed.len(), 2);

        // the stored x.png keeps its name; x_1 was already taken
        assert_eq!(fs::read(paths.all_dir.join("x.png")).unwrap(), b"x.png");
        assert_eq!(fs::read(paths.all_dir.join("x_1.jpg")).unwrap(), b"x_1.jpg");
        let bases: HashSet<String> = fs::read_dir(&paths.all_dir)
            .unwrap()
            .map(|e| {
                let name = e.unwrap().file_name().into_string().unwrap();
                crate::core::scanner::split_ext(&name).0.to_string()
            })
            .collect();
        assert_eq!(bases.len(), 5);
        assert!(bases.contains("x_2"));
        assert!(bases.contains("x_3"));

        let again = uniquify_base_names(&ctx).unwrap();
        assert!(again.renamed.is_empty());
    }
}
