//! Archive classification
//!
//! # Error Handling Strategy
//!
//! [`classify`] never fails. Every problem is converted into a best-effort
//! [`ArchiveMetadata`] and logged:
//!
//! - **Corrupt container**: the archive cannot be opened, so a fallback record (category
//!   `Other`, name from the filename) carries the error text in its description.
//! - **Malformed vehicle/map metadata**: the fields are scraped from the raw text instead and
//!   the category is kept; the parse error is kept in `additional_info.parse_error`.
//! - **Unreadable metadata entry, or malformed metadata in the `Other` path**: a fallback
//!   record of that category with the error text and whatever preview images could be found.
//! - **Unreadable images**: skipped with a warning.
//!
//! Detection order is vehicle, then map, then the generic `Other` record.

pub mod entries;
pub mod fallback;
pub mod map;
pub mod other;
pub mod vehicle;

use std::io::{Read, Seek};
use std::path::Path;

use tracing::{debug, info};

use crate::models::ArchiveMetadata;
pub use entries::ArchiveContents;
pub use map::MapInfo;
pub use vehicle::VehicleInfo;

/// Conventional name of the embedded metadata file
pub const METADATA_FILENAME: &str = "info.json";

/// Cap on preview images for the `Other` and fallback records
pub const FALLBACK_IMAGE_LIMIT: usize = 3;

pub const UNKNOWN: &str = "Unknown";
pub const UNKNOWN_ERROR_AUTHOR: &str = "Unknown (error)";
pub const NOT_AVAILABLE: &str = "N/A";

/// Classify the archive at `archive_path`
///
/// Opens the container, inspects its entry names and builds an [`ArchiveMetadata`] for the
/// first category that matches. Never returns an error; see the module docs.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use mod_triage::classify;
///
/// let metadata = classify(Path::new("/mods/pickup.zip"));
/// println!("{} by {} ({})", metadata.name, metadata.author, metadata.category);
/// ```
pub fn classify(archive_path: &Path) -> ArchiveMetadata {
    debug!("Analyzing zip file: {}", archive_path.display());
    match ArchiveContents::open(archive_path) {
        Ok(mut contents) => classify_contents(&mut contents),
        Err(e) => fallback::container_failure(archive_path, &format!("{:#}", e)),
    }
}

/// Classify an already opened archive
pub fn classify_contents<R: Read + Seek>(contents: &mut ArchiveContents<R>) -> ArchiveMetadata {
    debug!("Entry list for {}: {} entries", contents.path().display(), contents.names().len());

    if let Some(info_path) = vehicle::find_metadata(contents.names()).map(str::to_owned) {
        return vehicle::extract(contents, &info_path);
    }
    debug!("No vehicle info.json found.");

    if let Some(info_path) = map::find_metadata(contents.names()).map(str::to_owned) {
        return map::extract(contents, &info_path);
    }
    debug!("No map info.json file found.");

    let metadata = other::extract(contents);
    info!("Detected other mod: {}", metadata.name);
    metadata
}

/// Whether an entry's final component is the metadata filename
pub(crate) fn is_metadata_file(name: &str) -> bool {
    entries::file_name_of(name).eq_ignore_ascii_case(METADATA_FILENAME)
}
