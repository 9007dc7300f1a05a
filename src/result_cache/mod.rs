//! Persistent cache of classification results
//!
//! Keyed by archive file name and validated against the archive's modification time, so
//! reopening a large mods folder does not re-read every archive. Stored as a single JSON
//! document:
//!
//! ```json
//! { "_version": 1, "car.zip": { "name": "...", "author": "...", "type": "Vehicle",
//!                               "mod_time": 1700000000.0, "analyzed_time": 1700000100.0 } }
//! ```
//!
//! Default location: `<platform cache dir>/mod-triage/mod_cache.json`
//! - macOS: `~/Library/Caches/mod-triage/`
//! - Linux: `~/.cache/mod-triage/`
//! - Windows: `%LOCALAPPDATA%\mod-triage\`

pub mod entry;
pub mod persistence;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::models::ArchiveMetadata;
pub use entry::{CACHE_VERSION, CacheEntry, MTIME_EPSILON};
pub use persistence::{load_entries, save_entries};

const CACHE_FILENAME: &str = "mod_cache.json";

/// Platform cache location for the result cache
pub fn default_cache_path() -> Result<PathBuf> {
    let base = dirs::cache_dir().context("Failed to get platform cache directory")?;
    Ok(base.join("mod-triage").join(CACHE_FILENAME))
}

#[derive(Debug)]
pub struct ResultCache {
    path: PathBuf,
    entries: BTreeMap<String, CacheEntry>,
}

impl ResultCache {
    /// Load the cache at `path`; any problem with the file yields an empty cache
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = load_entries(&path);
        info!("Loaded {} cache entries from {}", entries.len(), path.display());
        Self { path, entries }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cached entry for `filename` if it is still fresh for `mod_time`
    pub fn get(&self, filename: &str, mod_time: Option<f64>) -> Option<&CacheEntry> {
        let Some(entry) = self.entries.get(filename) else {
            debug!("Cache miss for '{}'", filename);
            return None;
        };
        if entry.is_fresh(mod_time) {
            debug!("Cache hit for '{}'", filename);
            Some(entry)
        } else {
            info!(
                "Cache outdated for '{}' (file={:?}, cache={:?})",
                filename, mod_time, entry.mod_time
            );
            None
        }
    }

    pub fn is_analyzed(&self, filename: &str, mod_time: Option<f64>) -> bool {
        self.get(filename, mod_time).is_some()
    }

    /// Record `metadata` for `filename` and save the cache
    pub fn update(&mut self, filename: &str, mod_time: Option<f64>, metadata: &ArchiveMetadata) -> Result<()> {
        debug!("Updating cache for '{}'", filename);
        self.insert(filename, CacheEntry::new(metadata, mod_time));
        self.save()
    }

    /// Add or replace an entry without saving; call [`save`](Self::save) afterwards
    pub fn insert(&mut self, filename: &str, entry: CacheEntry) {
        self.entries.insert(filename.to_string(), entry);
    }

    /// Forget `filename`; saves only when something was removed
    pub fn remove(&mut self, filename: &str) -> Result<()> {
        if self.entries.remove(filename).is_some() {
            debug!("Removing '{}' from cache", filename);
            self.save()?;
        }
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        save_entries(&self.path, &self.entries)
    }
}
