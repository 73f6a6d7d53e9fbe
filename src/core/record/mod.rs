//! # Record Module
//!
//! The canonical in-memory metadata of one picture.
//!
//! A record is built from the metadata embedded in the file and is cached in
//! `info.json`. The file and thumbnail paths are derived from the store key
//! and the library directories, so they are never serialized and the cache
//! stays relocatable.

mod orientation;
mod types;

pub use orientation::Orientation;
pub use types::{dec_deg_from_dms, Exposure, GpsCoord, GpsMisc, PixelSize};

use crate::core::scanner::{base_name, split_ext, ImageFormat};
use chrono::{DateTime, Local, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Bits per sample assumed when the file does not say
pub const DEFAULT_DEPTH: u8 = 8;

/// Metadata of one picture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PictureRecord {
    /// Path of the real file, derived from key + ext
    #[serde(skip)]
    pub file: PathBuf,
    /// Extension including the leading dot
    pub ext: String,
    /// Free-text description (ImageDescription)
    pub desc: String,
    /// Modification time of the file when this record was built
    pub file_mod: Option<DateTime<Utc>>,
    pub format: ImageFormat,
    /// Burst number disambiguating captures in the same second
    pub number: u32,
    /// Stored pixel size, before orientation
    pub size: PixelSize,
    pub depth: u8,
    pub orient: Orientation,
    /// Capture time in camera-local time
    pub date_taken: Option<NaiveDateTime>,
    /// Time the metadata was last modified
    pub date_mod: Option<NaiveDateTime>,
    pub gps_loc: GpsCoord,
    pub gps_misc: GpsMisc,
    pub gps_date: Option<NaiveDateTime>,
    pub exposure: Exposure,
    /// Tags without a dedicated field, by name
    pub tags: BTreeMap<String, String>,
    /// Path of the thumbnail, derived from key
    #[serde(skip)]
    pub thumb: PathBuf,
    /// Sweep flag used by cache cleanup
    #[serde(skip)]
    pub flagged: bool,
}

impl Default for PictureRecord {
    fn default() -> Self {
        Self {
            file: PathBuf::new(),
            ext: String::new(),
            desc: String::new(),
            file_mod: None,
            format: ImageFormat::Unknown,
            number: 0,
            size: PixelSize::default(),
            depth: DEFAULT_DEPTH,
            orient: Orientation::Undefined,
            date_taken: None,
            date_mod: None,
            gps_loc: GpsCoord::default(),
            gps_misc: GpsMisc::default(),
            gps_date: None,
            exposure: Exposure::default(),
            tags: BTreeMap::new(),
            thumb: PathBuf::new(),
            flagged: false,
        }
    }
}

impl PictureRecord {
    /// Empty record for a file path, with extension and format filled in
    pub fn new(file: impl Into<PathBuf>) -> Self {
        let file = file.into();
        let name = file
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let ext = split_ext(name).1.to_string();
        let format = ImageFormat::from_path(&file);
        Self {
            file,
            ext,
            format,
            ..Default::default()
        }
    }

    /// Record holding only what the file system knows about a file.
    ///
    /// The capture date falls back to the modification time, so a record
    /// built from it always has a date.
    pub fn from_file_system(file: impl Into<PathBuf>, modified: SystemTime) -> Self {
        let mut record = Self::new(file);
        record.set_file_mod(modified);
        record.date_taken = record.file_mod_local();
        record.date_mod = record.date_taken;
        record
    }

    /// The cached modification time as a local wall-clock time
    fn file_mod_local(&self) -> Option<NaiveDateTime> {
        self.file_mod
            .map(|file_mod| file_mod.with_timezone(&Local).naive_local())
    }

    /// The file-system-only baseline of this record, used as the starting
    /// point when re-parsing its embedded metadata
    pub fn file_baseline(&self) -> Self {
        let mut baseline = Self::new(&self.file);
        baseline.thumb = self.thumb.clone();
        baseline.file_mod = self.file_mod;
        baseline.date_taken = self.file_mod_local();
        baseline.date_mod = baseline.date_taken;
        baseline
    }

    /// Store key: file name without extension
    pub fn key(&self) -> String {
        base_name(&self.file)
    }

    /// File name for this record under a given key
    pub fn file_name_for(&self, key: &str) -> String {
        format!("{}{}", key, self.ext)
    }

    /// Recompute `file` and `thumb` from a key and the library directories
    pub fn set_derived_paths(&mut self, key: &str, all_dir: &Path, thumb_dir: &Path) {
        self.file = all_dir.join(self.file_name_for(key));
        self.thumb = thumb_path(thumb_dir, key);
    }

    /// Record the file modification time at one-second precision
    pub fn set_file_mod(&mut self, modified: SystemTime) {
        let utc = DateTime::<Utc>::from(modified);
        self.file_mod = DateTime::<Utc>::from_timestamp(utc.timestamp(), 0);
    }

    /// Whether this record was built from the file as it is now
    pub fn is_fresh_for(&self, modified: SystemTime) -> bool {
        self.file_mod
            .map(|cached| cached.timestamp() == DateTime::<Utc>::from(modified).timestamp())
            .unwrap_or(false)
    }

    /// Size of the picture as displayed
    pub fn display_size(&self) -> PixelSize {
        let (width, height) = self.orient.orient_size(self.size.width, self.size.height);
        PixelSize::new(width, height)
    }

    /// Human-readable list of the metadata fields that differ from `other`.
    ///
    /// Derived paths and the sweep flag are not compared.
    pub fn diffs_to(&self, other: &PictureRecord) -> Vec<String> {
        let mut diffs = Vec::new();
        macro_rules! cmp {
            ($field:ident) => {
                if self.$field != other.$field {
                    diffs.push(format!(
                        "{}: {:?} != {:?}",
                        stringify!($field),
                        self.$field,
                        other.$field
                    ));
                }
            };
        }
        cmp!(ext);
        cmp!(desc);
        cmp!(format);
        cmp!(number);
        cmp!(size);
        cmp!(depth);
        cmp!(orient);
        cmp!(date_taken);
        cmp!(date_mod);
        cmp!(gps_loc);
        cmp!(gps_misc);
        cmp!(gps_date);
        cmp!(exposure);
        for (name, value) in &self.tags {
            match other.tags.get(name) {
                Some(theirs) if theirs == value => {}
                Some(theirs) => diffs.push(format!("tag {}: {:?} != {:?}", name, value, theirs)),
                None => diffs.push(format!("tag {}: only in first", name)),
            }
        }
        for name in other.tags.keys() {
            if !self.tags.contains_key(name) {
                diffs.push(format!("tag {}: only in second", name));
            }
        }
        diffs
    }
}

/// Thumbnail path for a key
pub fn thumb_path(thumb_dir: &Path, key: &str) -> PathBuf {
    thumb_dir.join(format!("{}.jpg", key))
}

/// A file system time as a local wall-clock time
pub fn local_naive(time: SystemTime) -> NaiveDateTime {
    DateTime::<Local>::from(time).naive_local()
}

/// Sort records ascending by capture date; ties keep file name order
pub fn sort_by_date(records: &mut [PictureRecord]) {
    records.sort_by(|a, b| {
        a.date_taken
            .cmp(&b.date_taken)
            .then_with(|| a.file.cmp(&b.file))
    });
}
