//! Edits of single pictures: rotation, capture date, duplication.
//!
//! Every edit changes the record in memory, writes the file, rebuilds the
//! thumbnail and only then updates the store.

use super::{check_album, Library, ALL_FOLDER};
use crate::core::codec::{self, encode_update, write_container};
use crate::core::imaging::{apply_orientation, rotate_pixels, FastDecoder};
use crate::core::integrity::links;
use crate::core::integrity::names::unique_name_number;
use crate::core::record::{Orientation, PictureRecord, PixelSize};
use crate::core::scanner::{FolderLister, ImageFormat};
use crate::error::{CodecError, ImagingError, IntegrityError, Result};
use chrono::{Duration, NaiveDateTime};
use image::DynamicImage;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

fn io_error(path: &Path, source: std::io::Error) -> IntegrityError {
    IntegrityError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// The container's own metadata blob, if it can be carried into a rewrite
fn rewritable_blob(record: &PictureRecord) -> Result<Option<Vec<u8>>> {
    let bytes = fs::read(&record.file).map_err(|source| CodecError::Io {
        path: record.file.clone(),
        source,
    })?;
    Ok(codec::decode(&bytes, record.format)
        .filter(|raw| raw.is_rewritable())
        .map(|raw| raw.blob))
}

impl Library {
    fn require(&self, key: &str) -> Result<PictureRecord> {
        self.store.get(key).ok_or_else(|| {
            IntegrityError::RecordNotFound {
                key: key.to_string(),
            }
            .into()
        })
    }

    /// Rotate a picture by 90, -90 or 180 degrees.
    ///
    /// JPEG files only get a new orientation tag. Other files have their
    /// pixels rotated; HEIC files become JPEG in the process.
    pub fn rotate(&self, key: &str, degrees: i32) -> Result<PictureRecord> {
        let degrees = match degrees {
            90 | -90 | 180 => degrees,
            -180 => 180,
            _ => return Err(IntegrityError::InvalidRotation { degrees }.into()),
        };
        let mut record = self.require(key)?;

        let turned = record.orient.rotate(degrees);
        if record.format == ImageFormat::Jpeg && turned != record.orient {
            record.orient = turned;
            codec::save_jpeg_metadata(&mut record)?;
            return self.finish_edit(key, record);
        }

        let pixels = FastDecoder::decode(&record.file, record.format)?;
        let oriented = apply_orientation(pixels, record.orient);
        let rotated = rotate_pixels(&oriented, degrees)
            .ok_or(IntegrityError::InvalidRotation { degrees })?;
        record.orient = Orientation::Normal;
        record.size = PixelSize::new(rotated.width(), rotated.height());

        match record.format {
            ImageFormat::Jpeg => {
                let existing = rewritable_blob(&record)?;
                let (blob, _) = encode_update(existing.as_deref(), &mut record)?;
                write_container(&record.file, Some(&blob), &rotated, self.config.jpeg_quality)?;
            }
            ImageFormat::Heic => self.convert_to_jpeg(key, &mut record, &rotated)?,
            _ => write_container(&record.file, None, &rotated, self.config.jpeg_quality)?,
        }
        self.finish_edit(key, record)
    }

    /// Set the capture date of a picture and store it in the file.
    ///
    /// Files other than JPEG are converted to JPEG to hold the metadata.
    pub fn set_capture_date(&self, key: &str, date: NaiveDateTime) -> Result<PictureRecord> {
        let mut record = self.require(key)?;
        record.date_taken = Some(date);

        if record.format == ImageFormat::Jpeg {
            codec::save_jpeg_metadata(&mut record)?;
        } else {
            let pixels = FastDecoder::decode(&record.file, record.format)?;
            let oriented = apply_orientation(pixels, record.orient);
            record.orient = Orientation::Normal;
            record.size = PixelSize::new(oriented.width(), oriented.height());
            self.convert_to_jpeg(key, &mut record, &oriented)?;
        }
        self.finish_edit(key, record)
    }

    /// Set capture dates of several pictures, `step` apart, starting at `start`
    pub fn set_capture_dates(
        &self,
        keys: &[String],
        start: NaiveDateTime,
        step: Duration,
    ) -> Result<Vec<PictureRecord>> {
        let mut date = start;
        let mut records = Vec::with_capacity(keys.len());
        for key in keys {
            records.push(self.set_capture_date(key, date)?);
            date += step;
        }
        Ok(records)
    }

    /// Copy a picture under the next free canonical name for its capture
    /// time, and link the copy into `album` when one is given.
    pub fn duplicate(&self, key: &str, album: Option<&str>) -> Result<PictureRecord> {
        let record = self.require(key)?;
        let date = record.date_taken.ok_or_else(|| IntegrityError::MissingDate {
            key: key.to_string(),
        })?;
        if let Some(album) = album.filter(|a| *a != ALL_FOLDER) {
            check_album(album)?;
        }

        let mut taken: HashSet<String> = FolderLister::any_file()
            .list(&self.paths.all_dir)?
            .entries
            .into_iter()
            .map(|e| e.base)
            .collect();
        taken.extend(self.store.keys());
        let (new_key, number) = unique_name_number(&date, record.number, |name| taken.contains(name));

        let mut copy = record.clone();
        copy.ext = record.ext.to_lowercase();
        copy.number = number;
        copy.set_derived_paths(&new_key, &self.paths.all_dir, &self.paths.thumb_dir);
        fs::copy(&record.file, &copy.file).map_err(|e| io_error(&copy.file, e))?;
        if record.thumb.exists() {
            if let Err(e) = fs::copy(&record.thumb, &copy.thumb) {
                warn!(thumb = %record.thumb.display(), error = %e, "Could not copy thumbnail");
            }
        }
        let modified = fs::metadata(&copy.file)
            .and_then(|m| m.modified())
            .map_err(|e| io_error(&copy.file, e))?;
        copy.set_file_mod(modified);

        if let Some(album) = album.filter(|a| *a != ALL_FOLDER) {
            links::link_to_album(&self.paths, album, &[copy.file_name_for(&new_key)])?;
        }
        info!(from = key, to = %new_key, "Duplicated picture");
        self.finish_edit(&new_key, copy)
    }

    /// Write `pixels` as `All/<key>.jpg` carrying the record's metadata,
    /// remove the old file and point album links at the new one
    fn convert_to_jpeg(
        &self,
        key: &str,
        record: &mut PictureRecord,
        pixels: &DynamicImage,
    ) -> Result<()> {
        let old_file = record.file.clone();
        let old_name = record.file_name_for(key);
        let existing = rewritable_blob(record)?;

        record.ext = ".jpg".to_string();
        record.format = ImageFormat::Jpeg;
        record.set_derived_paths(key, &self.paths.all_dir, &self.paths.thumb_dir);
        let new_name = record.file_name_for(key);
        if record.file.exists() && record.file != old_file {
            return Err(io_error(
                &record.file,
                std::io::Error::new(std::io::ErrorKind::AlreadyExists, "target name is taken"),
            )
            .into());
        }

        let (blob, _) = encode_update(existing.as_deref(), record)?;
        write_container(&record.file, Some(&blob), pixels, self.config.jpeg_quality)?;
        if old_file != record.file {
            fs::remove_file(&old_file).map_err(|e| io_error(&old_file, e))?;
            links::retarget_links(&self.paths, &old_name, &new_name)?;
        }
        info!(from = %old_name, to = %new_name, "Converted picture to JPEG");
        Ok(())
    }

    fn finish_edit(&self, key: &str, mut record: PictureRecord) -> Result<PictureRecord> {
        let modified = fs::metadata(&record.file)
            .and_then(|m| m.modified())
            .map_err(|e| io_error(&record.file, e))?;
        record.set_file_mod(modified);
        self.thumbs.generate(&record).map_err(|e: ImagingError| {
            warn!(key, error = %e, "Thumbnail failed after edit");
            e
        })?;
        self.store.insert(key, record.clone());
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::integrity::links::link_target;
    use chrono::NaiveDate;
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    fn library(dir: &TempDir) -> Library {
        Library::builder(dir.path().join("lib"))
            .thumb_dir(dir.path().join("thumbs"))
            .workers(1)
            .open()
            .unwrap()
    }

    fn add(library: &Library, name: &str, width: u32, height: u32) {
        let mut pixels = RgbImage::from_pixel(width, height, Rgb([200, 50, 50]));
        pixels.put_pixel(0, 0, Rgb([0, 0, 255]));
        DynamicImage::ImageRgb8(pixels)
            .save(library.paths().all_dir.join(name))
            .unwrap();
    }

    fn date() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2020, 7, 4)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap()
    }

    #[test]
    fn rotating_a_jpeg_only_touches_orientation() {
        let dir = TempDir::new().unwrap();
        let lib = library(&dir);
        add(&lib, "a.jpg", 40, 20);
        lib.reconcile(ALL_FOLDER).unwrap();

        let rotated = lib.rotate("a", 90).unwrap();
        assert_eq!(rotated.orient, Orientation::Rotated90L);
        assert_eq!(rotated.size, PixelSize::new(40, 20));
        assert_eq!(rotated.display_size(), PixelSize::new(20, 40));
        assert_eq!(image::image_dimensions(&rotated.file).unwrap(), (40, 20));

        let back = lib.rotate("a", -90).unwrap();
        assert_eq!(back.orient, Orientation::Normal);
        assert_eq!(lib.record("a").unwrap().orient, Orientation::Normal);
    }

    #[test]
    fn rotating_a_png_turns_pixels() {
        let dir = TempDir::new().unwrap();
        let lib = library(&dir);
        add(&lib, "p.png", 40, 20);
        lib.reconcile(ALL_FOLDER).unwrap();

        let rotated = lib.rotate("p", 90).unwrap();
        assert_eq!(rotated.size, PixelSize::new(20, 40));
        assert_eq!(image::image_dimensions(&rotated.file).unwrap(), (20, 40));
        assert!(rotated.thumb.exists());
    }

    #[test]
    fn odd_angles_are_rejected() {
        let dir = TempDir::new().unwrap();
        let lib = library(&dir);
        add(&lib, "a.jpg", 8, 8);
        lib.reconcile(ALL_FOLDER).unwrap();
        assert!(lib.rotate("a", 45).is_err());
        assert!(lib.rotate("missing", 90).is_err());
    }

    #[test]
    fn capture_date_converts_png_to_jpeg() {
        let dir = TempDir::new().unwrap();
        let lib = library(&dir);
        add(&lib, "p.png", 16, 8);
        lib.reconcile(ALL_FOLDER).unwrap();
        lib.link_to_album("Trip", &["p.png".into()]).unwrap();

        let record = lib.set_capture_date("p", date()).unwrap();
        assert_eq!(record.ext, ".jpg");
        assert_eq!(record.format, ImageFormat::Jpeg);
        assert!(!lib.paths().all_dir.join("p.png").exists());
        assert_eq!(
            fs::read_link(lib.paths().folder("Trip").join("p.jpg")).unwrap(),
            link_target("p.jpg")
        );

        let reread = codec::read_record(&record.file, &record.file_baseline()).unwrap();
        assert_eq!(reread.date_taken, Some(date()));
    }

    #[test]
    fn duplicate_gets_next_canonical_name() {
        let dir = TempDir::new().unwrap();
        let lib = library(&dir);
        add(&lib, "a.jpg", 8, 8);
        lib.reconcile(ALL_FOLDER).unwrap();
        lib.set_capture_date("a", date()).unwrap();

        let first = lib.duplicate("a", Some("Copies")).unwrap();
        let second = lib.duplicate("a", None).unwrap();
        assert_eq!(first.key(), "img_200704_123000_n0");
        assert_eq!(second.key(), "img_200704_123000_n1");
        assert_eq!(fs::read(&first.file).unwrap(), fs::read(lib.record("a").unwrap().file).unwrap());
        assert!(lib.paths().folder("Copies").join("img_200704_123000_n0.jpg").exists());
    }
}
