use std::io::{Read, Seek};

use serde_json::{Map, Value, json};
use tracing::{debug, info, warn};

use super::entries::{ArchiveContents, dir_of, file_name_of, has_dir_segment, join_entry};
use super::{NOT_AVAILABLE, UNKNOWN, fallback, is_metadata_file};
use crate::models::{ArchiveMetadata, Category, PreviewImage};
use crate::parsers::extractor::{
    MAX_METADATA_BYTES, decode_text, extract_field, extract_raw_value, extract_structured, lookup,
    split_list, top_level_text, value_to_list, value_to_text,
};

const LEVELS_SEGMENT: &str = "levels";
const UNKNOWN_MAP: &str = "Unknown Map";

/// Fields recovered from a level `info.json`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapInfo {
    pub title: Option<String>,
    pub authors: Option<String>,
    pub biome: Option<String>,
    pub description: Option<String>,
    pub roads: Vec<String>,
    pub suitable_for: Vec<String>,
    /// Preview file names as written in the metadata, relative to its directory
    pub previews: Vec<String>,
    pub width: Option<String>,
    pub height: Option<String>,
}

impl MapInfo {
    pub fn from_value(value: &Value) -> Self {
        let text = |key: &str| lookup(value, key).and_then(value_to_text);
        let list = |key: &str| lookup(value, key).map(value_to_list).unwrap_or_default();
        let size = list("size");

        Self {
            title: text("title"),
            authors: lookup(value, "authors").and_then(joined_text),
            biome: text("biome"),
            description: text("description"),
            roads: list("roads"),
            suitable_for: list("suitablefor"),
            previews: list("previews"),
            width: size.first().cloned(),
            height: size.get(1).cloned(),
        }
    }

    /// Pattern-scrape the same fields from text that is not valid JSON
    pub fn scrape(text: &str) -> Self {
        let top = top_level_text(text);
        let field = |key: &str| extract_field(&top, key, None);
        let list = |key: &str| extract_raw_value(&top, key, None).map(|raw| split_list(&raw)).unwrap_or_default();
        let size = list("size");

        Self {
            title: field("title"),
            authors: field("authors").or_else(|| {
                let authors = list("authors");
                (!authors.is_empty()).then(|| authors.join(", "))
            }),
            biome: field("biome"),
            description: field("description"),
            roads: list("roads"),
            suitable_for: list("suitablefor"),
            previews: list("previews"),
            width: size.first().cloned(),
            height: size.get(1).cloned(),
        }
    }

    /// JSON snapshot of whatever was recovered, keyed like the source document
    pub fn to_raw_value(&self) -> Value {
        let mut out = Map::new();
        let scalars = [
            ("title", &self.title),
            ("authors", &self.authors),
            ("biome", &self.biome),
            ("description", &self.description),
        ];
        for (key, value) in scalars {
            if let Some(v) = value {
                out.insert(key.to_string(), Value::String(v.clone()));
            }
        }
        let lists = [("roads", &self.roads), ("suitablefor", &self.suitable_for), ("previews", &self.previews)];
        for (key, value) in lists {
            if !value.is_empty() {
                out.insert(key.to_string(), json!(value));
            }
        }
        if self.width.is_some() || self.height.is_some() {
            out.insert("size".to_string(), json!([self.width, self.height]));
        }
        Value::Object(out)
    }

    pub fn describe(&self) -> String {
        let na = |v: &Option<String>| v.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string());
        let na_list = |v: &[String]| if v.is_empty() { NOT_AVAILABLE.to_string() } else { v.join(", ") };

        [
            format!("Biome: {}", na(&self.biome)),
            format!("Size: {} x {}", na(&self.width), na(&self.height)),
            format!("\nDescription: {}", na(&self.description)),
            format!("\nRoads: {}", na_list(&self.roads)),
            format!("Suitable for: {}", na_list(&self.suitable_for)),
        ]
        .join("\n")
    }
}

fn joined_text(value: &Value) -> Option<String> {
    match value {
        Value::Array(_) => {
            let items = value_to_list(value);
            (!items.is_empty()).then(|| items.join(", "))
        }
        other => value_to_text(other),
    }
}

/// First `info.json` that lives under a `levels` directory
pub fn find_metadata(names: &[String]) -> Option<&str> {
    names
        .iter()
        .find(|name| has_dir_segment(name, LEVELS_SEGMENT) && is_metadata_file(name))
        .map(String::as_str)
}

pub fn extract<R: Read + Seek>(contents: &mut ArchiveContents<R>, info_path: &str) -> ArchiveMetadata {
    debug!("Found map info.json: {}", info_path);

    let bytes = match contents.read_entry(info_path, MAX_METADATA_BYTES) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Could not read map metadata {}: {:#}", info_path, e);
            return fallback::metadata_failure(contents, info_path, Category::Map, &format!("{:#}", e));
        }
    };

    let (info, raw_info, parse_error) = match extract_structured(&bytes) {
        Ok(value) => (MapInfo::from_value(&value), value, None),
        Err(e) => {
            warn!("Map info.json in {} is not valid JSON, scraping fields: {}", contents.path().display(), e);
            let info = MapInfo::scrape(&decode_text(&bytes));
            let raw = info.to_raw_value();
            (info, raw, Some(e.to_string()))
        }
    };

    let base_dir = dir_of(info_path).to_string();
    let preview_images = collect_previews(contents, &base_dir, &info.previews);

    let mut additional_info = Map::new();
    additional_info.insert("roads".to_string(), json!(info.roads));
    additional_info.insert("suitable_for".to_string(), json!(info.suitable_for));
    additional_info.insert(
        "spawn_points".to_string(),
        lookup(&raw_info, "spawnPoints").cloned().unwrap_or_else(|| Value::Array(Vec::new())),
    );
    additional_info.insert("previews".to_string(), json!(info.previews));
    if let Some(error) = parse_error {
        additional_info.insert("parse_error".to_string(), Value::String(error));
    }
    additional_info.insert("raw_info".to_string(), raw_info);

    let metadata = ArchiveMetadata {
        name: info.title.clone().unwrap_or_else(|| UNKNOWN_MAP.to_string()),
        author: info.authors.clone().unwrap_or_else(|| UNKNOWN.to_string()),
        category: Category::Map,
        description: info.describe(),
        preview_images,
        additional_info,
    };
    info!("Map mod detected: {}", metadata.name);
    metadata
}

fn collect_previews<R: Read + Seek>(
    contents: &mut ArchiveContents<R>,
    base_dir: &str,
    previews: &[String],
) -> Vec<PreviewImage> {
    let mut images = Vec::new();
    for preview in previews {
        let path = join_entry(base_dir, preview);
        if !contents.contains(&path) {
            debug!("Map preview {} listed but not present", path);
            continue;
        }
        if let Some(image) = contents.read_image(&path, file_name_of(&path)) {
            images.push(image);
        }
    }
    images
}
