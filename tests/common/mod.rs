//! Shared test utilities for integration tests
#![allow(dead_code)]

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Smallest valid PNG (1x1 transparent pixel)
pub const TINY_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52, 0x00, 0x00,
    0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F, 0x15, 0xC4, 0x89, 0x00, 0x00, 0x00,
    0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00, 0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D,
    0xB4, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

/// Builder for ZIP archive fixtures
#[derive(Default)]
pub struct ArchiveBuilder {
    entries: Vec<(String, Vec<u8>)>,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry with the given content
    pub fn with_entry(mut self, name: &str, content: impl AsRef<[u8]>) -> Self {
        self.entries.push((name.to_string(), content.as_ref().to_vec()));
        self
    }

    /// A vehicle mod: `vehicles/<model>/info.json` plus the given configurations
    pub fn vehicle(model: &str, info_json: &str, configs: &[&str]) -> Self {
        let mut builder = Self::new().with_entry(&format!("vehicles/{}/info.json", model), info_json);
        for config in configs {
            builder = builder
                .with_entry(&format!("vehicles/{}/{}.pc", model, config), "{}")
                .with_entry(&format!("vehicles/{}/{}.jpg", model, config), TINY_PNG);
        }
        builder
    }

    /// A map mod: `levels/<level>/info.json`
    pub fn map(level: &str, info_json: &str) -> Self {
        Self::new().with_entry(&format!("levels/{}/info.json", level), info_json)
    }

    /// Write the archive to `path`
    pub fn write_to(&self, path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create archive directory");
        }
        let file = File::create(path).expect("Failed to create archive");
        let mut writer = ZipWriter::new(file);
        for (name, content) in &self.entries {
            writer.start_file(name.as_str(), SimpleFileOptions::default()).expect("Failed to start entry");
            writer.write_all(content).expect("Failed to write entry");
        }
        writer.finish().expect("Failed to finish archive");
    }
}

/// Builder for a temporary mods directory full of archives
pub struct ModsDirBuilder {
    temp_dir: TempDir,
}

impl ModsDirBuilder {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        fs::create_dir(temp_dir.path().join("mods")).expect("Failed to create mods dir");
        Self { temp_dir }
    }

    /// The mods directory itself
    pub fn mods_dir(&self) -> PathBuf {
        self.temp_dir.path().join("mods")
    }

    /// Scratch space next to the mods directory (cache files, move targets)
    pub fn scratch(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    pub fn with_archive(self, name: &str, archive: ArchiveBuilder) -> Self {
        archive.write_to(&self.mods_dir().join(name));
        self
    }

    /// Add a file that is not a valid archive
    pub fn with_raw_file(self, name: &str, content: &[u8]) -> Self {
        fs::write(self.mods_dir().join(name), content).expect("Failed to write file");
        self
    }

    pub fn path_of(&self, name: &str) -> PathBuf {
        self.mods_dir().join(name)
    }

    pub fn build(self) -> TempDir {
        self.temp_dir
    }
}

impl Default for ModsDirBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The three-archive layout used across tests: a vehicle, a map with malformed JSON and an
/// archive without any metadata
pub fn sample_mods_dir() -> ModsDirBuilder {
    ModsDirBuilder::new()
        .with_archive(
            "A.zip",
            ArchiveBuilder::vehicle(
                "pickup",
                r#"{"Name": "Pickup", "Author": "BeamNG", "Brand": "Gavril", "Body Style": "Pickup"}"#,
                &["base", "offroad"],
            ),
        )
        .with_archive(
            "B.zip",
            ArchiveBuilder::map(
                "test_track",
                r#"{"title": "Test Track", "authors": "Someone", "biome": "desert", broken json here"#,
            ),
        )
        .with_archive("C.zip", ArchiveBuilder::new().with_entry("readme.txt", "no metadata"))
}

/// Entry names of the archive at `path`
pub fn entry_names(path: &Path) -> Vec<String> {
    let archive = zip::ZipArchive::new(File::open(path).expect("open archive")).expect("read archive");
    archive.file_names().map(str::to_owned).collect()
}
