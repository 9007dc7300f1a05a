//! Cache file load/save with atomic writes

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::entry::{CACHE_VERSION, CacheEntry};

const VERSION_KEY: &str = "_version";

/// Read the cache file at `path`.
///
/// A missing, unreadable or malformed file, or one written with a different
/// [`CACHE_VERSION`], yields an empty cache. Individual malformed entries are skipped.
pub fn load_entries(path: &Path) -> BTreeMap<String, CacheEntry> {
    if !path.exists() {
        info!("Cache file not found at {}, starting empty", path.display());
        return BTreeMap::new();
    }

    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Failed to read cache file {}: {}, starting empty", path.display(), e);
            return BTreeMap::new();
        }
    };

    let mut object = match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Object(object)) => object,
        Ok(_) => {
            warn!("Cache file {} is not a JSON object, starting empty", path.display());
            return BTreeMap::new();
        }
        Err(e) => {
            warn!("Error decoding cache file {}: {}, starting empty", path.display(), e);
            return BTreeMap::new();
        }
    };

    let version = object.remove(VERSION_KEY).and_then(|v| v.as_u64());
    if version != Some(CACHE_VERSION) {
        warn!("Cache version mismatch (expected {}, found {:?}), discarding", CACHE_VERSION, version);
        return BTreeMap::new();
    }

    object
        .into_iter()
        .filter_map(|(filename, value)| match serde_json::from_value::<CacheEntry>(value) {
            Ok(entry) => Some((filename, entry)),
            Err(e) => {
                warn!("Dropping malformed cache entry for {}: {}", filename, e);
                None
            }
        })
        .collect()
}

/// Write all entries to `path` via a temp file in the same directory and a rename
pub fn save_entries(path: &Path, entries: &BTreeMap<String, CacheEntry>) -> Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).with_context(|| format!("Failed to create cache directory {}", dir.display()))?;

    let mut object = Map::new();
    object.insert(VERSION_KEY.to_string(), Value::from(CACHE_VERSION));
    for (filename, entry) in entries {
        object.insert(filename.clone(), serde_json::to_value(entry).context("Failed to serialize cache entry")?);
    }
    let json = serde_json::to_string_pretty(&Value::Object(object)).context("Failed to serialize cache")?;

    let mut temp = tempfile::NamedTempFile::new_in(dir).context("Failed to create cache temp file")?;
    temp.write_all(json.as_bytes()).context("Failed to write cache temp file")?;
    temp.persist(path).with_context(|| format!("Failed to replace cache file {}", path.display()))?;

    debug!("Saved {} cache entries to {}", entries.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::models::Category;

    fn sample_entries() -> BTreeMap<String, CacheEntry> {
        let mut entries = BTreeMap::new();
        entries.insert(
            "car.zip".to_string(),
            CacheEntry {
                name: "Car".to_string(),
                author: "Someone".to_string(),
                category: Category::Vehicle,
                mod_time: Some(12.5),
                analyzed_time: 13.0,
            },
        );
        entries
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("cache.json");

        save_entries(&path, &sample_entries()).unwrap();
        let raw: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["_version"], 1);
        assert_eq!(raw["car.zip"]["name"], "Car");

        assert_eq!(load_entries(&path), sample_entries());
    }

    #[test]
    fn test_version_mismatch_discards_everything() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");
        fs::write(&path, r#"{"_version": 0, "car.zip": {"name": "Car", "type": "Vehicle"}}"#).unwrap();

        assert!(load_entries(&path).is_empty());
    }

    #[test]
    fn test_corrupt_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(load_entries(&path).is_empty());
        assert!(load_entries(&dir.path().join("missing.json")).is_empty());
    }

    #[test]
    fn test_malformed_entry_is_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");
        fs::write(
            &path,
            r#"{"_version": 1, "bad.zip": 42, "ok.zip": {"name": "Ok", "author": "A", "type": "map", "mod_time": null}}"#,
        )
        .unwrap();

        let entries = load_entries(&path);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries["ok.zip"].category, Category::Map);
        assert!(entries["ok.zip"].mod_time.is_none());
    }
}
