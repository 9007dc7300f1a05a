//! Plain-text and JSON views of classification results

use serde_json::{Map, Value, json};

use crate::classifier::NOT_AVAILABLE;
use crate::models::{ArchiveFileRecord, ArchiveMetadata, Category, MarkerRecord};
use crate::utils::{format_filesize, format_timestamp, strip_control_sequences};

/// Category-specific summary of `additional_info`
pub fn format_additional_info(metadata: &ArchiveMetadata) -> String {
    let info = &metadata.additional_info;
    match metadata.category {
        Category::Vehicle => {
            let configs = string_list(info.get("configurations"));
            let paints: Vec<&str> =
                info.get("paints").and_then(Value::as_object).map(|p| p.keys().map(String::as_str).collect()).unwrap_or_default();

            let mut parts = vec![
                "Configurations:".to_string(),
                or_none(configs.join(", ")),
                "\nAvailable Paints:".to_string(),
                or_none(paints.join(", ")),
            ];
            if let Some(tuning) = info.get("raw_info").and_then(|raw| raw.get("Tuning")) {
                parts.push("\nAvailable Tuning:".to_string());
                parts.push(pretty(tuning));
            }
            parts.join("\n")
        }
        Category::Map => {
            let spawn_points = info.get("spawn_points").and_then(Value::as_array).map_or(0, Vec::len);
            format!(
                "Spawn points: {}\nRoads: {}\nSuitable for: {}\n\nFull info:\n{}",
                spawn_points,
                string_list(info.get("roads")).join(", "),
                string_list(info.get("suitable_for")).join(", "),
                pretty(info.get("raw_info").unwrap_or(&Value::Object(Map::new()))),
            )
        }
        Category::Other => metadata.additional_info_pretty(),
    }
}

/// Full human-readable report for one archive
pub fn render_details(
    record: &ArchiveFileRecord,
    metadata: &ArchiveMetadata,
    marker: Option<&MarkerRecord>,
) -> String {
    let mut out = String::new();
    out.push_str(&format!("File:        {}\n", clean(&record.name)));
    out.push_str(&format!("Size:        {}\n", format_filesize(record.size_bytes)));
    out.push_str(&format!("Modified:    {}\n", format_timestamp(record.modified_time)));
    out.push_str(&format!("Type:        {}\n", metadata.category));
    out.push_str(&format!("Name:        {}\n", clean(&metadata.name)));
    out.push_str(&format!("Author:      {}\n", clean(&metadata.author)));
    out.push_str(&format!("Status:      {}\n", marker_status(marker)));

    let images = metadata.image_names();
    out.push_str(&format!(
        "Images:      {}\n",
        if images.is_empty() { NOT_AVAILABLE.to_string() } else { clean(&images.join(", ")) }
    ));

    out.push_str("\nDescription:\n");
    out.push_str(&clean(&metadata.description));
    out.push_str("\n\nAdditional info:\n");
    out.push_str(&clean(&format_additional_info(metadata)));
    out.push('\n');
    out
}

/// One line per archive for listings
pub fn render_row(record: &ArchiveFileRecord, category: Category, name: &str, marked: bool) -> String {
    format!(
        "{} {:<7} {:>10}  {}  {}",
        if marked { "*" } else { " " },
        category.as_str(),
        format_filesize(record.size_bytes),
        clean(&record.name),
        clean(name),
    )
}

pub fn details_json(record: &ArchiveFileRecord, metadata: &ArchiveMetadata, marker: Option<&MarkerRecord>) -> Value {
    let images: Vec<Value> = metadata
        .preview_images
        .iter()
        .map(|img| json!({ "name": img.name, "size": img.bytes.len() }))
        .collect();
    json!({
        "file": record.name,
        "path": record.path,
        "size_bytes": record.size_bytes,
        "modified_time": record.modified_time,
        "name": metadata.name,
        "author": metadata.author,
        "type": metadata.category,
        "description": metadata.description,
        "preview_images": images,
        "additional_info": metadata.additional_info,
        "marker": marker,
    })
}

fn marker_status(marker: Option<&MarkerRecord>) -> String {
    match marker {
        Some(MarkerRecord { timestamp: Some(ts), .. }) => format!("sorted ({})", ts.format("%Y-%m-%d %H:%M")),
        Some(_) => "sorted".to_string(),
        None => "unsorted".to_string(),
    }
}

fn string_list(value: Option<&Value>) -> Vec<&str> {
    value.and_then(Value::as_array).map(|items| items.iter().filter_map(Value::as_str).collect()).unwrap_or_default()
}

fn or_none(text: String) -> String {
    if text.is_empty() { "None".to_string() } else { text }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn clean(text: &str) -> String {
    strip_control_sequences(text)
}
