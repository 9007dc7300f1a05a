/// Marker lifecycle against real archives on disk
mod common;

use std::fs;

use common::{ArchiveBuilder, ModsDirBuilder, entry_names, sample_mods_dir};
use mod_triage::marker::MARKER_ENTRY_NAME;
use mod_triage::{
    Category, MarkerOutcome, MarkerStore, WriteStrategy, classify, delete_marker, has_marker, read_marker,
};

fn marker_entries(path: &std::path::Path) -> usize {
    entry_names(path).iter().filter(|n| *n == MARKER_ENTRY_NAME).count()
}

#[test]
fn test_marker_state_machine() {
    let mods = sample_mods_dir();
    let path = mods.path_of("A.zip");
    let metadata = classify(&path);
    let store = MarkerStore::default();

    // Unmarked -> Marked
    assert!(!has_marker(&path));
    assert_eq!(store.write_marker(&path, &metadata).unwrap(), MarkerOutcome::Written);
    assert!(has_marker(&path));

    // Marked -> Marked (no-op)
    assert_eq!(store.write_marker(&path, &metadata).unwrap(), MarkerOutcome::AlreadyMarked);
    assert_eq!(marker_entries(&path), 1);

    // Marked -> Unmarked
    assert_eq!(delete_marker(&path).unwrap(), MarkerOutcome::Removed);
    assert!(!has_marker(&path));
    assert_eq!(delete_marker(&path).unwrap(), MarkerOutcome::NotMarked);
}

#[test]
fn test_marker_round_trip_matches_metadata() {
    let mods = sample_mods_dir();
    for name in ["A.zip", "B.zip", "C.zip"] {
        let path = mods.path_of(name);
        let metadata = classify(&path);
        MarkerStore::default().write_marker(&path, &metadata).unwrap();

        let marker = read_marker(&path).unwrap();
        assert_eq!(marker.name, metadata.name);
        assert_eq!(marker.author, metadata.author);
        assert_eq!(marker.category, metadata.category);
    }
}

#[test]
fn test_second_write_keeps_first_content() {
    let mods = sample_mods_dir();
    let path = mods.path_of("C.zip");
    let store = MarkerStore::default();

    let mut first = classify(&path);
    first.name = "First".to_string();
    store.write_marker(&path, &first).unwrap();

    let mut second = first.clone();
    second.name = "Second".to_string();
    store.write_marker(&path, &second).unwrap();

    assert_eq!(read_marker(&path).unwrap().name, "First");
}

#[test]
fn test_marking_preserves_archive_contents_and_classification() {
    let mods = sample_mods_dir();
    let path = mods.path_of("A.zip");
    let before = entry_names(&path);
    let metadata = classify(&path);

    MarkerStore::default().write_marker(&path, &metadata).unwrap();

    let after = entry_names(&path);
    assert_eq!(after.len(), before.len() + 1);
    assert!(before.iter().all(|name| after.contains(name)));

    let reclassified = classify(&path);
    assert_eq!(reclassified.category, Category::Vehicle);
    assert_eq!(reclassified.name, metadata.name);
    assert_eq!(reclassified.preview_images, metadata.preview_images);
}

#[test]
fn test_append_strategy() {
    let mods = sample_mods_dir();
    let path = mods.path_of("B.zip");
    let store = MarkerStore::new(WriteStrategy::Append);

    store.write_marker(&path, &classify(&path)).unwrap();
    store.write_marker(&path, &classify(&path)).unwrap();

    assert_eq!(marker_entries(&path), 1);
    assert_eq!(read_marker(&path).unwrap().name, "Test Track");
    assert_eq!(classify(&path).category, Category::Map);
}

#[test]
fn test_failed_write_leaves_no_trace() {
    let mods = ModsDirBuilder::new().with_raw_file("bad.zip", b"not a zip archive at all");
    let path = mods.path_of("bad.zip");
    let metadata = classify(&path);

    for strategy in [WriteStrategy::Rewrite, WriteStrategy::Append] {
        assert!(MarkerStore::new(strategy).write_marker(&path, &metadata).is_err());
        assert_eq!(fs::read(&path).unwrap(), b"not a zip archive at all");
    }

    let leftovers: Vec<_> = fs::read_dir(mods.mods_dir()).unwrap().flatten().map(|e| e.file_name()).collect();
    assert_eq!(leftovers, vec![std::ffi::OsString::from("bad.zip")]);
}

#[test]
fn test_delete_marker_keeps_other_entries() {
    let mods = ModsDirBuilder::new().with_archive(
        "dup.zip",
        ArchiveBuilder::new()
            .with_entry(MARKER_ENTRY_NAME, "{}")
            .with_entry("readme.txt", "x"),
    );
    let path = mods.path_of("dup.zip");

    assert!(has_marker(&path));
    delete_marker(&path).unwrap();
    assert_eq!(entry_names(&path), vec!["readme.txt"]);
}
