//! Renaming pictures after their capture time.

use super::names::{canonical_base, unique_name_number};
use super::{rename_picture, IntegrityContext, RenameReport};
use crate::core::codec;
use crate::core::scanner::{FolderLister, ImageFormat};
use crate::error::{IntegrityError, LibraryError};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Give every stored picture its canonical name,
/// `img_<yymmdd_HHMMSS>_n<N>` with the smallest free burst number.
///
/// Pictures already named after their date and number are untouched.
/// Pictures are visited in capture order so bursts keep their sequence.
pub fn rename_by_date(ctx: &IntegrityContext<'_>) -> Result<RenameReport, LibraryError> {
    let listing = FolderLister::any_file().list(&ctx.paths.all_dir)?;
    let mut taken: HashSet<String> = listing.entries.into_iter().map(|e| e.base).collect();
    taken.extend(ctx.store.keys());

    let mut snapshot = ctx.store.snapshot();
    snapshot.sort_by(|a, b| {
        (a.1.date_taken, a.1.number, &a.0).cmp(&(b.1.date_taken, b.1.number, &b.0))
    });

    let mut report = RenameReport::default();
    for (key, record) in snapshot {
        if !record.file.is_file() {
            debug!(key = %key, "Stale record, file is gone");
            continue;
        }
        let Some(date) = record.date_taken else {
            let error = IntegrityError::MissingDate { key: key.clone() };
            report.errors.push(error.to_string());
            ctx.report_error(&key, error.to_string());
            continue;
        };
        if key == canonical_base(&date, record.number) {
            report.unchanged += 1;
            continue;
        }

        let (new_key, number) = unique_name_number(&date, 0, |name| taken.contains(name));
        if let Err(e) = rename_picture(ctx, &key, &record.ext, &new_key) {
            report.errors.push(format!("{}{}: {}", key, record.ext, e));
            ctx.report_error(&key, e.to_string());
            continue;
        }
        taken.remove(&key);
        taken.insert(new_key.clone());
        report.renamed.push((
            format!("{}{}", key, record.ext),
            format!("{}{}", new_key, record.ext),
        ));

        let had_number = record.number != 0;
        ctx.store.update(&new_key, |stored| stored.number = number);
        // a number that came from the file must not contradict the new name
        if had_number && record.number != number && record.format == ImageFormat::Jpeg {
            if let Some(mut stored) = ctx.store.get(&new_key) {
                match codec::save_jpeg_metadata(&mut stored) {
                    Ok(_) => ctx.store.insert(new_key.clone(), stored),
                    Err(e) => warn!(key = %new_key, error = %e, "Could not store burst number"),
                }
            }
        }
    }

    info!(
        renamed = report.renamed.len(),
        unchanged = report.unchanged,
        "Renamed pictures by date"
    );
    Ok(report)
}
