//! Integration tests for integrity operations.
//!
//! These tests verify:
//! - Duplicate cleaning and its idempotence
//! - The lower burst number wins among duplicates
//! - Base-name uniqueness with pre-existing suffixes
//! - Canonical renaming leaves canonical files alone
//! - Trash and restore are symmetric
//! - Cache cleanup pruning, with and without dry run

mod common;

use assert_fs::prelude::*;
use assert_fs::TempDir;
use common::*;
use predicates::prelude::*;
use std::collections::HashSet;
use std::fs;

fn base_names(temp: &TempDir) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(all_dir(temp))
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    names.sort();
    names
}

#[test]
fn duplicates_go_to_trash_once() {
    let temp = TempDir::new().unwrap();
    let library = open_library(&temp);
    let all = all_dir(&temp);
    write_jpeg(&all.join("orig.jpg"), &taken("2021:05:01 09:00:00"), 40);
    fs::copy(all.join("orig.jpg"), all.join("copy.jpg")).unwrap();
    write_jpeg(&all.join("other.jpg"), &taken("2021:05:01 09:00:00"), 41);
    library.reconcile("All").unwrap();

    let dry = library.clean_duplicates(true).unwrap();
    assert_eq!(dry.pairs.len(), 1);
    temp.child("lib/All/copy.jpg").assert(predicate::path::exists());

    let report = library.clean_duplicates(false).unwrap();
    assert_eq!(report.pairs.len(), 1);
    // same burst number: the smaller key stays
    assert_eq!(report.pairs[0].kept, "copy");
    assert_eq!(report.pairs[0].removed, "orig");
    temp.child("lib/Trash/orig.jpg").assert(predicate::path::exists());
    temp.child("lib/All/orig.jpg").assert(predicate::path::missing());
    assert!(library.record("orig").is_none());

    let again = library.clean_duplicates(false).unwrap();
    assert!(again.pairs.is_empty());
    assert_eq!(base_names(&temp), ["copy.jpg", "other.jpg"]);
}

#[test]
fn duplicate_with_lower_burst_number_is_kept() {
    let temp = TempDir::new().unwrap();
    let library = open_library(&temp);
    let all = all_dir(&temp);
    // n10 sorts before n9 by name, so only the burst number decides
    write_jpeg(&all.join("img_210501_090000_n10.jpg"), &taken("2021:05:01 09:00:00"), 40);
    fs::copy(
        all.join("img_210501_090000_n10.jpg"),
        all.join("img_210501_090000_n9.jpg"),
    )
    .unwrap();
    library.reconcile("All").unwrap();
    temp.child("thumbs/img_210501_090000_n10.jpg")
        .assert(predicate::path::exists());
    assert_eq!(library.record("img_210501_090000_n9").unwrap().number, 9);
    assert_eq!(library.record("img_210501_090000_n10").unwrap().number, 10);

    let report = library.clean_duplicates(false).unwrap();
    assert_eq!(report.pairs.len(), 1);
    assert_eq!(report.pairs[0].kept, "img_210501_090000_n9");
    assert_eq!(report.pairs[0].removed, "img_210501_090000_n10");
    temp.child("lib/Trash/img_210501_090000_n10.jpg")
        .assert(predicate::path::exists());
    temp.child("thumbs/img_210501_090000_n10.jpg")
        .assert(predicate::path::missing());
    assert_eq!(base_names(&temp), ["img_210501_090000_n9.jpg"]);
}

#[test]
fn uniquify_steps_over_existing_suffixes() {
    let temp = TempDir::new().unwrap();
    let library = open_library(&temp);
    let all = all_dir(&temp);
    write_jpeg(&all.join("pic.jpg"), &taken("2021:01:01 00:00:00"), 1);
    write_jpeg(&all.join("pic_1.jpg"), &taken("2021:01:01 00:00:01"), 2);
    write_jpeg(&all.join("pic_2.jpg"), &taken("2021:01:01 00:00:02"), 3);
    image::DynamicImage::new_rgb8(4, 4)
        .save(all.join("pic.png"))
        .unwrap();
    library.reconcile("All").unwrap();
    library.link_to_album("Set", &["pic.png".to_string()]).unwrap();

    let report = library.uniquify_base_names().unwrap();
    assert_eq!(report.renamed.len(), 1);

    let names = base_names(&temp);
    let bases: HashSet<&str> = names
        .iter()
        .map(|n| n.rsplit_once('.').map_or(n.as_str(), |(b, _)| b))
        .collect();
    assert_eq!(bases.len(), names.len());
    assert!(bases.contains("pic_3"));

    // the album link follows whichever file moved
    let (old, new) = &report.renamed[0];
    if old == "pic.png" {
        temp.child(format!("lib/Set/{}", new))
            .assert(predicate::path::exists());
    }
    assert_eq!(library.store().len(), 4);
}

#[test]
fn canonical_names_are_left_untouched() {
    let temp = TempDir::new().unwrap();
    let library = open_library(&temp);
    let all = all_dir(&temp);
    let canonical = all.join("img_210501_090000_n0.jpg");
    write_jpeg(&canonical, &taken("2021:05:01 09:00:00"), 9);
    write_jpeg(&all.join("DSC_0001.jpg"), &taken("2021:05:01 09:00:00"), 10);
    library.reconcile("All").unwrap();
    let before = mtime(&canonical);

    let report = library.rename_by_date().unwrap();
    assert_eq!(report.unchanged, 1);
    assert_eq!(
        report.renamed,
        [("DSC_0001.jpg".to_string(), "img_210501_090000_n1.jpg".to_string())]
    );
    assert_eq!(mtime(&canonical), before);
    assert!(library.record("img_210501_090000_n1").is_some());

    let again = library.rename_by_date().unwrap();
    assert!(again.renamed.is_empty());
    assert_eq!(again.unchanged, 2);
}

#[test]
fn trash_and_untrash_are_symmetric() {
    let temp = TempDir::new().unwrap();
    let library = open_library(&temp);
    let all = all_dir(&temp);
    write_jpeg(&all.join("keep.jpg"), &taken("2022:02:02 02:02:02"), 7);
    write_jpeg(&all.join("drop.jpg"), &taken("2022:02:02 02:02:03"), 8);
    library.reconcile("All").unwrap();
    library
        .link_to_album("Best", &["drop.jpg".to_string(), "keep.jpg".to_string()])
        .unwrap();
    let original = library.record("drop").unwrap();

    let trashed = library.trash_files(&["drop.jpg".to_string()]).unwrap();
    assert_eq!(trashed.links_removed, 1);
    temp.child("lib/Trash/drop.jpg").assert(predicate::path::exists());
    temp.child("lib/Best/drop.jpg").assert(predicate::path::missing());
    temp.child("lib/Best/keep.jpg").assert(predicate::path::exists());
    assert!(library.record("drop").is_none());

    let restored = library.untrash_files(&["drop.jpg".to_string()]).unwrap();
    assert_eq!(restored.moved, ["drop.jpg"]);
    temp.child("lib/Trash/drop.jpg").assert(predicate::path::missing());
    assert_eq!(library.record("drop").unwrap().date_taken, original.date_taken);
}

#[test]
fn cache_cleanup_prunes_vanished_files() {
    let temp = TempDir::new().unwrap();
    let library = open_library(&temp);
    let all = all_dir(&temp);
    write_jpeg(&all.join("stay.jpg"), &taken("2023:03:03 03:03:03"), 3);
    write_jpeg(&all.join("gone.jpg"), &taken("2023:03:03 03:03:04"), 4);
    library.reconcile("All").unwrap();
    fs::remove_file(all.join("gone.jpg")).unwrap();

    let dry = library.clean_cache(true).unwrap();
    assert!(dry.dry_run);
    assert_eq!(dry.pruned, ["gone"]);
    assert!(library.record("gone").is_some());

    let report = library.clean_cache(false).unwrap();
    assert_eq!(report.checked, 1);
    assert_eq!(report.mismatched, 0);
    assert_eq!(report.pruned, ["gone"]);
    assert!(library.record("gone").is_none());
    assert!(library.record("stay").is_some());
}
