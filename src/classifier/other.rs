use std::io::{Read, Seek};

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::entries::{ArchiveContents, file_name_of, is_image};
use super::{FALLBACK_IMAGE_LIMIT, METADATA_FILENAME, UNKNOWN, fallback};
use crate::models::{ArchiveMetadata, Category, PreviewImage};
use crate::parsers::extractor::{MAX_METADATA_BYTES, extract_structured, lookup, value_to_text};

const OTHER_DESCRIPTION: &str = "Unknown mod type. Please review contents manually.";

/// Any entry whose name ends in `info.json`, wherever it sits
pub fn find_metadata(names: &[String]) -> Option<&str> {
    names
        .iter()
        .find(|name| name.to_ascii_lowercase().ends_with(METADATA_FILENAME))
        .map(String::as_str)
}

/// Build the record for an archive that is neither a vehicle nor a map.
///
/// The metadata file, if any, is only parsed structurally here; a document that fails to
/// parse yields the error fallback record instead of a scraped one.
pub fn extract<R: Read + Seek>(contents: &mut ArchiveContents<R>) -> ArchiveMetadata {
    debug!("Creating 'other' mod info for: {}", contents.path().display());

    let info_path = find_metadata(contents.names()).map(str::to_owned);
    let info = match &info_path {
        Some(path) => {
            debug!("Found info.json: {}", path);
            let parsed = contents
                .read_entry(path, MAX_METADATA_BYTES)
                .map_err(|e| format!("{:#}", e))
                .and_then(|bytes| extract_structured(&bytes).map_err(|e| e.to_string()));
            match parsed {
                Ok(value) => value,
                Err(message) => {
                    warn!("Could not parse {} in {}: {}", path, contents.path().display(), message);
                    return fallback::metadata_failure(contents, path, Category::Other, &message);
                }
            }
        }
        None => Value::Object(Map::new()),
    };

    let text = |keys: &[&str]| keys.iter().find_map(|key| lookup(&info, key).and_then(value_to_text));
    let name = text(&["name", "title"]).unwrap_or_else(|| {
        contents.path().file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_else(|| UNKNOWN.to_string())
    });
    let author = text(&["author", "authors"]).unwrap_or_else(|| UNKNOWN.to_string());

    let preview_images = first_images(contents, FALLBACK_IMAGE_LIMIT);

    let mut additional_info = Map::new();
    if let Some(path) = info_path {
        additional_info.insert("metadata_file".to_string(), Value::String(path));
    }
    additional_info.insert("raw_info".to_string(), info);

    let metadata = ArchiveMetadata {
        name,
        author,
        category: Category::Other,
        description: OTHER_DESCRIPTION.to_string(),
        preview_images,
        additional_info,
    };
    info!("Created 'other' mod info: {}", metadata.name);
    metadata
}

/// Up to `limit` images of any supported extension, in listing order
pub fn first_images<R: Read + Seek>(contents: &mut ArchiveContents<R>, limit: usize) -> Vec<PreviewImage> {
    let candidates: Vec<String> = contents.names().iter().filter(|n| is_image(n)).cloned().collect();
    let mut images = Vec::new();
    for path in candidates {
        if images.len() >= limit {
            break;
        }
        if let Some(image) = contents.read_image(&path, file_name_of(&path)) {
            images.push(image);
        }
    }
    images
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_metadata_matches_suffix_anywhere() {
        let names: Vec<String> = ["readme.txt", "scripts/thing/modInfo.JSON"].iter().map(|s| s.to_string()).collect();
        assert_eq!(find_metadata(&names), Some("scripts/thing/modInfo.JSON"));

        let names: Vec<String> = ["readme.txt"].iter().map(|s| s.to_string()).collect();
        assert_eq!(find_metadata(&names), None);
    }
}
