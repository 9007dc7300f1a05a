//! Records produced when an archive or its metadata cannot be read properly

use std::io::{Read, Seek};
use std::path::Path;

use serde_json::{Map, Value};
use tracing::{debug, error, info};

use super::entries::{ArchiveContents, IMAGE_EXTENSIONS, archive_stem, dir_of, file_name_of, is_image, join_entry};
use super::{FALLBACK_IMAGE_LIMIT, UNKNOWN_ERROR_AUTHOR};
use crate::models::{ArchiveMetadata, Category, PreviewImage};

/// Record for an archive that could not be opened at all
pub fn container_failure(path: &Path, message: &str) -> ArchiveMetadata {
    error!("Creating fallback mod info for {} due to: {}", path.display(), message);
    build(
        archive_stem(path),
        Category::Other,
        format!("Could not open archive: {}\n\nCould not load mod details.", message),
        Vec::new(),
        message,
    )
}

/// Record for an archive whose metadata entry could not be read or parsed
pub fn metadata_failure<R: Read + Seek>(
    contents: &mut ArchiveContents<R>,
    info_path: &str,
    category: Category,
    message: &str,
) -> ArchiveMetadata {
    error!("Creating fallback mod info for {} due to: {}", contents.path().display(), message);
    let images = scan_images(contents, dir_of(info_path));
    let metadata = build(
        contents.display_stem(),
        category,
        format!("Error parsing info.json: {}\n\nCould not load mod details.", message),
        images,
        message,
    );
    info!("Created fallback mod info: {}", metadata.name);
    metadata
}

fn build(
    name: String,
    category: Category,
    description: String,
    preview_images: Vec<PreviewImage>,
    message: &str,
) -> ArchiveMetadata {
    let mut additional_info = Map::new();
    additional_info.insert("error".to_string(), Value::String(message.to_string()));
    additional_info.insert("raw_info".to_string(), Value::Object(Map::new()));

    ArchiveMetadata {
        name,
        author: UNKNOWN_ERROR_AUTHOR.to_string(),
        category,
        description,
        preview_images,
        additional_info,
    }
}

/// `preview.<ext>` next to the metadata first, then any image in listing order, capped
fn scan_images<R: Read + Seek>(contents: &mut ArchiveContents<R>, info_dir: &str) -> Vec<PreviewImage> {
    let mut candidates: Vec<String> = IMAGE_EXTENSIONS
        .iter()
        .map(|ext| join_entry(info_dir, &format!("preview.{}", ext)))
        .filter(|path| contents.contains(path))
        .collect();
    for name in contents.names() {
        if is_image(name) && !candidates.contains(name) {
            candidates.push(name.clone());
        }
    }

    let mut images = Vec::new();
    for path in candidates {
        if images.len() >= FALLBACK_IMAGE_LIMIT {
            break;
        }
        if let Some(image) = contents.read_image(&path, file_name_of(&path)) {
            debug!("Found fallback image {}", path);
            images.push(image);
        }
    }
    images
}
