//! User settings loaded from a JSON file
//!
//! ```json
//! {
//!   "move_folders": [
//!     { "name": "Cars", "path": "sorted/cars", "key": "c" },
//!     { "name": "Maps", "path": "/mnt/archive/maps" }
//!   ],
//!   "skip_marked": true,
//!   "marker_strategy": "rewrite"
//! }
//! ```
//!
//! A bare array of move folders is accepted as well.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::marker::WriteStrategy;
use crate::utils::paths::resolve_against;

/// A named destination the current archive can be moved to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveFolder {
    pub name: String,
    pub path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl MoveFolder {
    /// Destination directory, relative paths taken from the mods root
    pub fn resolve(&self, root: &Path) -> PathBuf {
        resolve_against(root, &self.path)
    }

    /// Matches by shortcut key (exact) or by name (case-insensitive)
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim();
        self.key.as_deref() == Some(query) || self.name.eq_ignore_ascii_case(query)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(deserialize_with = "deserialize_move_folders")]
    pub move_folders: Vec<MoveFolder>,
    pub skip_marked: bool,
    pub marker_strategy: WriteStrategy,
    pub cache_file: Option<PathBuf>,
}

impl Settings {
    /// Load settings from `path`. A missing file gives the defaults; a file that exists but
    /// cannot be parsed is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("Config file not found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path).with_context(|| format!("Failed to read config file {}", path.display()))?;
        let settings = Self::from_json(&raw).with_context(|| format!("Invalid config file {}", path.display()))?;
        info!("Loaded config from {} ({} move folders)", path.display(), settings.move_folders.len());
        Ok(settings)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw).context("Failed to parse config JSON")?;
        if value.is_array() {
            let move_folders = folders_from_values(serde_json::from_value(value)?);
            return Ok(Self { move_folders, ..Self::default() });
        }
        serde_json::from_value(value).context("Unexpected config structure")
    }

    pub fn find_move_folder(&self, query: &str) -> Option<&MoveFolder> {
        self.move_folders.iter().find(|folder| folder.matches(query))
    }
}

fn deserialize_move_folders<'de, D>(deserializer: D) -> Result<Vec<MoveFolder>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(folders_from_values(values))
}

/// Keep the entries that carry a non-empty `name` and `path`
fn folders_from_values(values: Vec<Value>) -> Vec<MoveFolder> {
    values
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<MoveFolder>(value.clone()) {
            Ok(folder) if !folder.name.trim().is_empty() && !folder.path.as_os_str().is_empty() => Some(folder),
            _ => {
                warn!("Ignoring invalid move folder entry: {}", value);
                None
            }
        })
        .collect()
}
