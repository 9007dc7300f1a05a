/// End-to-end classification of archives written to disk
mod common;

use common::{ArchiveBuilder, ModsDirBuilder, TINY_PNG, sample_mods_dir};
use mod_triage::classifier::{UNKNOWN_ERROR_AUTHOR, classify_contents};
use mod_triage::classifier::entries::ArchiveContents;
use mod_triage::{Category, classify, enumerate};

#[test]
fn test_sample_directory_scenario() {
    let mods = sample_mods_dir();

    let records = enumerate(&mods.mods_dir()).unwrap();
    let names: Vec<_> = records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["A.zip", "B.zip", "C.zip"]);

    let vehicle = classify(&mods.path_of("A.zip"));
    assert_eq!(vehicle.category, Category::Vehicle);
    assert_eq!(vehicle.name, "Pickup");
    assert_eq!(vehicle.author, "BeamNG");
    assert!(vehicle.description.contains("Brand: Gavril"));
    assert_eq!(vehicle.image_names(), vec!["base", "offroad"]);
    assert_eq!(vehicle.additional_info["configurations"], serde_json::json!(["base", "offroad"]));

    let map = classify(&mods.path_of("B.zip"));
    assert_eq!(map.category, Category::Map);
    assert_eq!(map.name, "Test Track");
    assert_eq!(map.author, "Someone");
    assert!(map.additional_info.contains_key("parse_error"));

    let other = classify(&mods.path_of("C.zip"));
    assert_eq!(other.category, Category::Other);
    assert_eq!(other.name, "C.zip");
}

#[test]
fn test_archives_without_metadata_are_other() {
    let mods = ModsDirBuilder::new()
        .with_archive("empty.zip", ArchiveBuilder::new())
        .with_archive("textures.zip", ArchiveBuilder::new().with_entry("art/tex.dds", "x"))
        .with_archive("vehicle_no_info.zip", ArchiveBuilder::new().with_entry("vehicles/car/car.jbeam", "{}"));

    for name in ["empty.zip", "textures.zip", "vehicle_no_info.zip"] {
        assert_eq!(classify(&mods.path_of(name)).category, Category::Other, "{}", name);
    }
}

#[test]
fn test_corrupt_container_never_panics() {
    let mods = ModsDirBuilder::new().with_raw_file("broken.zip", b"PK\x03\x04 truncated");

    let metadata = classify(&mods.path_of("broken.zip"));
    assert_eq!(metadata.category, Category::Other);
    assert_eq!(metadata.name, "broken");
    assert_eq!(metadata.author, UNKNOWN_ERROR_AUTHOR);
    assert!(metadata.description.starts_with("Could not open archive:"));
    assert!(metadata.preview_images.is_empty());
}

#[test]
fn test_malformed_generic_metadata_produces_fallback_with_images() {
    let mods = ModsDirBuilder::new().with_archive(
        "skin.zip",
        ArchiveBuilder::new()
            .with_entry("art/info.json", r#"{"name": "Skin", oops"#)
            .with_entry("art/a.png", TINY_PNG)
            .with_entry("art/preview.jpg", TINY_PNG)
            .with_entry("art/b.png", TINY_PNG)
            .with_entry("art/c.png", TINY_PNG),
    );

    let metadata = classify(&mods.path_of("skin.zip"));
    assert_eq!(metadata.category, Category::Other);
    assert!(metadata.description.starts_with("Error parsing info.json:"));
    assert!(metadata.additional_info.contains_key("error"));
    assert_eq!(metadata.preview_images.len(), 3);
    assert_eq!(metadata.preview_images[0].name, "preview.jpg");
}

#[test]
fn test_generic_metadata_fields_and_image_cap() {
    let mut builder = ArchiveBuilder::new().with_entry("mod_info.json", r#"{"title": "Horn Pack", "authors": "Sound Guy"}"#);
    for i in 0..5 {
        builder = builder.with_entry(&format!("img/{}.png", i), TINY_PNG);
    }
    let mods = ModsDirBuilder::new().with_archive("horns.zip", builder);

    let metadata = classify(&mods.path_of("horns.zip"));
    assert_eq!(metadata.category, Category::Other);
    assert_eq!(metadata.name, "Horn Pack");
    assert_eq!(metadata.author, "Sound Guy");
    assert_eq!(metadata.image_names(), vec!["0.png", "1.png", "2.png"]);
}

#[test]
fn test_map_previews_resolve_relative_to_metadata() {
    let mods = ModsDirBuilder::new().with_archive(
        "island.zip",
        ArchiveBuilder::map(
            "island",
            r#"{"title": "Island", "authors": "Mapper", "previews": ["island_preview.jpg"],
                "roads": "asphalt, dirt", "suitablefor": "Racing", "size": [2048, 2048]}"#,
        )
        .with_entry("levels/island/island_preview.jpg", TINY_PNG),
    );

    let metadata = classify(&mods.path_of("island.zip"));
    assert_eq!(metadata.category, Category::Map);
    assert_eq!(metadata.preview_images.len(), 1);
    assert_eq!(metadata.additional_info["roads"], serde_json::json!(["asphalt", "dirt"]));
    assert!(metadata.description.contains("Size: 2048 x 2048"));
}

#[test]
fn test_classify_contents_from_memory() {
    let mods = sample_mods_dir();
    let mut contents = ArchiveContents::open(&mods.path_of("A.zip")).unwrap();
    assert_eq!(classify_contents(&mut contents).category, Category::Vehicle);
}

#[test]
fn test_default_image_always_comes_first() {
    let info = r#"{"Name": "Pickup", "Author": "BeamNG"}"#;
    let mods = ModsDirBuilder::new()
        .with_archive(
            "separate.zip",
            ArchiveBuilder::vehicle("pickup", info, &["base", "offroad"])
                .with_entry("vehicles/pickup/default.png", TINY_PNG),
        )
        .with_archive("config.zip", ArchiveBuilder::vehicle("pickup", info, &["base", "default", "offroad"]));

    let separate = classify(&mods.path_of("separate.zip"));
    assert_eq!(separate.image_names(), vec!["default", "base", "offroad"]);

    // `default` is also a configuration; its image must appear once, in front
    let config = classify(&mods.path_of("config.zip"));
    let names = config.image_names();
    assert_eq!(names[0], "default");
    assert_eq!(names.iter().filter(|n| **n == "default").count(), 1);
    assert_eq!(names.len(), 3);
}
