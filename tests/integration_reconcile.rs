//! Integration tests for folder reconciliation.
//!
//! These tests verify end-to-end behavior including:
//! - Capture date resolution and ordering
//! - Idempotence of repeated passes
//! - Rebuilding the cache from the files alone
//! - GPS decoding

mod common;

use assert_fs::prelude::*;
use assert_fs::TempDir;
use chrono::NaiveDateTime;
use common::*;
use exif::Tag;
use predicates::prelude::*;
use std::fs;

fn date(text: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S").unwrap()
}

#[test]
fn pictures_are_ordered_by_capture_date() {
    let temp = TempDir::new().unwrap();
    let library = open_library(&temp);
    let all = all_dir(&temp);

    // names sort opposite to capture order
    write_jpeg(&all.join("c.jpg"), &taken("2021:05:01 09:00:00"), 10);
    write_jpeg(&all.join("b.jpg"), &taken("2021:05:01 10:00:00"), 20);
    write_jpeg(&all.join("a.jpg"), &[], 30);
    set_mtime(&all.join("a.jpg"), local_time(2021, 6, 1, 12, 0, 0));

    let pass = library.reconcile("All").unwrap();
    let keys: Vec<String> = pass.records.iter().map(|r| r.key()).collect();
    assert_eq!(keys, ["c", "b", "a"]);
    assert_eq!(pass.records[0].date_taken, Some(date("2021-05-01 09:00:00")));
    assert_eq!(pass.records[2].date_taken, Some(date("2021-06-01 12:00:00")));
    assert_eq!(pass.thumbs.len(), 3);
    for thumb in &pass.thumbs {
        assert!(thumb.exists());
    }
}

#[test]
fn second_pass_changes_nothing() {
    let temp = TempDir::new().unwrap();
    let library = open_library(&temp);
    let all = all_dir(&temp);
    write_jpeg(&all.join("x.jpg"), &taken("2020:01:02 03:04:05"), 1);
    write_jpeg(&all.join("y.jpg"), &[], 2);

    let first = library.reconcile("All").unwrap();
    library.wait_for_save();
    let saved = fs::read_to_string(temp.path().join("lib/info.json")).unwrap();

    let second = library.reconcile("All").unwrap();
    library.wait_for_save();
    assert_eq!(second.decoded, 0);
    assert_eq!(second.thumbnails_generated, 0);
    assert_eq!(first.records, second.records);
    temp.child("lib/info.json")
        .assert(predicate::str::diff(saved.clone()));
    temp.child("lib/info.json~")
        .assert(predicate::str::diff(saved));
}

#[test]
fn cache_and_thumbnails_rebuild_from_files() {
    let temp = TempDir::new().unwrap();
    let all = all_dir(&temp);
    let first = {
        let library = open_library(&temp);
        write_jpeg(&all.join("p.jpg"), &taken("2019:12:31 23:59:59"), 5);
        library.reconcile("All").unwrap()
    };

    fs::remove_file(temp.path().join("lib/info.json")).unwrap();
    fs::remove_dir_all(temp.path().join("thumbs")).unwrap();

    let library = open_library(&temp);
    assert!(library.store().is_empty());
    let rebuilt = library.reconcile("All").unwrap();
    assert_eq!(rebuilt.records, first.records);
    temp.child("thumbs/p.jpg").assert(predicate::path::exists());
}

#[test]
fn gps_position_is_decoded() {
    let temp = TempDir::new().unwrap();
    let library = open_library(&temp);
    let all = all_dir(&temp);
    let mut fields = taken("2018:07:14 15:00:00");
    fields.extend([
        field(Tag::GPSLatitudeRef, ascii("S")),
        field(Tag::GPSLatitude, dms(33, 51, 3500)),
        field(Tag::GPSLongitudeRef, ascii("E")),
        field(Tag::GPSLongitude, dms(151, 12, 3000)),
    ]);
    write_jpeg(&all.join("sydney.jpg"), &fields, 100);

    library.reconcile("All").unwrap();
    let record = library.record("sydney").unwrap();
    // 33 + 51/60 + 35/3600, 151 + 12/60 + 30/3600
    assert!((record.gps_loc.lat + 33.859_722).abs() < 1e-5);
    assert!((record.gps_loc.long - 151.208_333).abs() < 1e-5);
}

#[test]
fn album_folders_resolve_through_links() {
    let temp = TempDir::new().unwrap();
    let library = open_library(&temp);
    let all = all_dir(&temp);
    write_jpeg(&all.join("one.jpg"), &taken("2021:01:01 00:00:00"), 1);
    write_jpeg(&all.join("two.jpg"), &taken("2021:01:02 00:00:00"), 2);
    library.reconcile("All").unwrap();

    library
        .link_to_album("Winter", &["two.jpg".to_string()])
        .unwrap();
    let pass = library.reconcile("Winter").unwrap();
    assert_eq!(pass.records.len(), 1);
    assert_eq!(pass.records[0].file, all.join("two.jpg"));
    assert_eq!(library.albums(), ["Winter"]);
}

#[test]
fn missing_folder_is_an_error() {
    let temp = TempDir::new().unwrap();
    let library = open_library(&temp);
    assert!(library.reconcile("Nowhere").is_err());
}
