use std::io::{Read, Seek};

use serde_json::{Map, Value, json};
use tracing::{debug, info, warn};

use super::entries::{ArchiveContents, dir_of, file_name_of, has_dir_segment, split_extension};
use super::{NOT_AVAILABLE, UNKNOWN, fallback, is_metadata_file};
use crate::models::{ArchiveMetadata, Category, PreviewImage};
use crate::parsers::extractor::{
    MAX_METADATA_BYTES, decode_text, extract_field, extract_raw_value, extract_structured, lookup,
    top_level_text, value_to_text,
};

const VEHICLES_SEGMENT: &str = "vehicles";
const CONFIG_EXTENSION: &str = "pc";
const CONFIG_IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];
const DEFAULT_IMAGES: [&str; 2] = ["default.png", "default.jpg"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineInfo {
    pub engine_type: Option<String>,
    pub configuration: Option<String>,
    pub displacement: Option<String>,
    pub power: Option<String>,
}

impl EngineInfo {
    fn is_empty(&self) -> bool {
        self.engine_type.is_none()
            && self.configuration.is_none()
            && self.displacement.is_none()
            && self.power.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransmissionInfo {
    pub transmission_type: Option<String>,
    pub gears: Option<String>,
}

impl TransmissionInfo {
    fn is_empty(&self) -> bool {
        self.transmission_type.is_none() && self.gears.is_none()
    }
}

/// Fields recovered from a vehicle `info.json`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VehicleInfo {
    pub name: Option<String>,
    pub author: Option<String>,
    pub country: Option<String>,
    pub derby_class: Option<String>,
    pub vehicle_type: Option<String>,
    pub brand: Option<String>,
    pub body_style: Option<String>,
    pub engine: EngineInfo,
    pub transmission: TransmissionInfo,
    pub years_min: Option<String>,
    pub years_max: Option<String>,
}

impl VehicleInfo {
    pub fn from_value(value: &Value) -> Self {
        let text = |key: &str| lookup(value, key).and_then(value_to_text);
        let nested = |section: &str, key: &str| {
            lookup(value, section).and_then(|s| lookup(s, key)).and_then(value_to_text)
        };

        Self {
            name: text("Name"),
            author: text("Author"),
            country: text("Country"),
            derby_class: text("Derby Class"),
            vehicle_type: text("Type"),
            brand: text("Brand"),
            body_style: text("Body Style"),
            engine: EngineInfo {
                engine_type: nested("Engine", "Type"),
                configuration: nested("Engine", "Configuration"),
                displacement: nested("Engine", "Displacement"),
                power: nested("Engine", "Power"),
            },
            transmission: TransmissionInfo {
                transmission_type: nested("Transmission", "Type"),
                gears: nested("Transmission", "Gears"),
            },
            years_min: nested("Years", "min"),
            years_max: nested("Years", "max"),
        }
    }

    /// Pattern-scrape the same fields from text that is not valid JSON
    pub fn scrape(text: &str) -> Self {
        let top = top_level_text(text);
        let field = |key: &str| extract_field(&top, key, None);
        let nested = |section: &str, key: &str| {
            extract_field(text, key, Some(section))
                .or_else(|| extract_raw_value(text, key, Some(section)))
        };

        Self {
            name: field("Name"),
            author: field("Author"),
            country: field("Country"),
            derby_class: field("Derby Class"),
            vehicle_type: field("Type"),
            brand: field("Brand"),
            body_style: field("Body Style"),
            engine: EngineInfo {
                engine_type: nested("Engine", "Type"),
                configuration: nested("Engine", "Configuration"),
                displacement: nested("Engine", "Displacement"),
                power: nested("Engine", "Power"),
            },
            transmission: TransmissionInfo {
                transmission_type: nested("Transmission", "Type"),
                gears: nested("Transmission", "Gears"),
            },
            years_min: nested("Years", "min"),
            years_max: nested("Years", "max"),
        }
    }

    /// JSON snapshot of whatever was recovered, keyed like the source document
    pub fn to_raw_value(&self) -> Value {
        let mut out = Map::new();
        put(&mut out, "Name", &self.name);
        put(&mut out, "Author", &self.author);
        put(&mut out, "Country", &self.country);
        put(&mut out, "Derby Class", &self.derby_class);
        put(&mut out, "Type", &self.vehicle_type);
        put(&mut out, "Brand", &self.brand);
        put(&mut out, "Body Style", &self.body_style);

        let mut engine = Map::new();
        put(&mut engine, "Type", &self.engine.engine_type);
        put(&mut engine, "Configuration", &self.engine.configuration);
        put(&mut engine, "Displacement", &self.engine.displacement);
        put(&mut engine, "Power", &self.engine.power);
        if !engine.is_empty() {
            out.insert("Engine".to_string(), Value::Object(engine));
        }

        let mut transmission = Map::new();
        put(&mut transmission, "Type", &self.transmission.transmission_type);
        put(&mut transmission, "Gears", &self.transmission.gears);
        if !transmission.is_empty() {
            out.insert("Transmission".to_string(), Value::Object(transmission));
        }

        let mut years = Map::new();
        put(&mut years, "min", &self.years_min);
        put(&mut years, "max", &self.years_max);
        if !years.is_empty() {
            out.insert("Years".to_string(), Value::Object(years));
        }

        Value::Object(out)
    }

    /// Multi-line description with `N/A` for anything missing
    pub fn describe(&self) -> String {
        let na = |v: &Option<String>| v.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string());

        let mut parts = vec![
            format!("Brand: {}", na(&self.brand)),
            format!("Body Style: {}", na(&self.body_style)),
            format!("Years: {}-{}", na(&self.years_min), na(&self.years_max)),
            format!("Country: {}", na(&self.country)),
            format!("Derby Class: {}", na(&self.derby_class)),
            format!("Type: {}", na(&self.vehicle_type)),
        ];

        if !self.engine.is_empty() {
            parts.push("\nEngine Details:".to_string());
            parts.push(format!("Type: {}", na(&self.engine.engine_type)));
            parts.push(format!("Configuration: {}", na(&self.engine.configuration)));
            parts.push(format!("Displacement: {}", na(&self.engine.displacement)));
            parts.push(format!("Power: {}", na(&self.engine.power)));
        }

        if !self.transmission.is_empty() {
            parts.push("\nTransmission:".to_string());
            parts.push(format!("Type: {}", na(&self.transmission.transmission_type)));
            parts.push(format!("Gears: {}", na(&self.transmission.gears)));
        }

        parts.join("\n")
    }
}

fn put(map: &mut Map<String, Value>, key: &str, value: &Option<String>) {
    if let Some(v) = value {
        map.insert(key.to_string(), Value::String(v.clone()));
    }
}

/// First `info.json` that lives under a `vehicles` directory
pub fn find_metadata(names: &[String]) -> Option<&str> {
    names
        .iter()
        .find(|name| has_dir_segment(name, VEHICLES_SEGMENT) && is_metadata_file(name))
        .map(String::as_str)
}

pub fn extract<R: Read + Seek>(contents: &mut ArchiveContents<R>, info_path: &str) -> ArchiveMetadata {
    debug!("Found vehicle info.json: {}", info_path);

    let bytes = match contents.read_entry(info_path, MAX_METADATA_BYTES) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Could not read vehicle metadata {}: {:#}", info_path, e);
            return fallback::metadata_failure(contents, info_path, Category::Vehicle, &format!("{:#}", e));
        }
    };

    let (info, raw_info, parse_error) = match extract_structured(&bytes) {
        Ok(value) => (VehicleInfo::from_value(&value), value, None),
        Err(e) => {
            warn!("Vehicle info.json in {} is not valid JSON, scraping fields: {}", contents.path().display(), e);
            let info = VehicleInfo::scrape(&decode_text(&bytes));
            let raw = info.to_raw_value();
            (info, raw, Some(e.to_string()))
        }
    };

    let base_dir = dir_of(info_path).to_string();
    let configurations = config_names(contents.names(), &base_dir);
    let preview_images = collect_images(contents, &base_dir, &configurations);

    let mut additional_info = Map::new();
    additional_info.insert("country".to_string(), json!(info.country));
    additional_info.insert("derby_class".to_string(), json!(info.derby_class));
    additional_info.insert("type".to_string(), json!(info.vehicle_type));
    additional_info.insert(
        "paints".to_string(),
        lookup(&raw_info, "paints").cloned().unwrap_or_else(|| Value::Object(Map::new())),
    );
    additional_info.insert("configurations".to_string(), json!(configurations));
    if let Some(error) = parse_error {
        additional_info.insert("parse_error".to_string(), Value::String(error));
    }
    additional_info.insert("raw_info".to_string(), raw_info);

    let metadata = ArchiveMetadata {
        name: info.name.clone().unwrap_or_else(|| UNKNOWN.to_string()),
        author: info.author.clone().unwrap_or_else(|| UNKNOWN.to_string()),
        category: Category::Vehicle,
        description: info.describe(),
        preview_images,
        additional_info,
    };
    info!("Vehicle mod detected: {}", metadata.name);
    metadata
}

/// Stems of every `.pc` configuration sitting next to the metadata file
fn config_names(names: &[String], base_dir: &str) -> Vec<String> {
    names
        .iter()
        .filter(|name| dir_of(name) == base_dir)
        .filter_map(|name| match split_extension(file_name_of(name)) {
            (stem, Some(ext)) if ext == CONFIG_EXTENSION => Some(stem.to_string()),
            _ => None,
        })
        .collect()
}

fn collect_images<R: Read + Seek>(
    contents: &mut ArchiveContents<R>,
    base_dir: &str,
    configurations: &[String],
) -> Vec<PreviewImage> {
    let in_dir = |file: &str| {
        if base_dir.is_empty() { file.to_string() } else { format!("{}/{}", base_dir, file) }
    };

    let mut images: Vec<(String, PreviewImage)> = Vec::new();
    for config in configurations {
        let candidate = CONFIG_IMAGE_EXTENSIONS
            .iter()
            .map(|ext| in_dir(&format!("{}.{}", config, ext)))
            .find(|path| contents.contains(path));
        if let Some(path) = candidate {
            if let Some(image) = contents.read_image(&path, config) {
                images.push((path, image));
            }
        }
    }

    let default = DEFAULT_IMAGES.iter().map(|file| in_dir(file)).find(|path| contents.contains(path));
    if let Some(path) = default {
        if let Some(image) = contents.read_image(&path, "default") {
            images.retain(|(existing, _)| existing != &path);
            images.insert(0, (path, image));
        }
    }

    images.into_iter().map(|(_, image)| image).collect()
}
