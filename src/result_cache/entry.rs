//! Cached classification summary for one archive

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::models::{ArchiveMetadata, Category};

/// Cache schema version; a file with any other `_version` is discarded wholesale
pub const CACHE_VERSION: u64 = 1;

/// Tolerance when comparing modification times in epoch seconds
pub const MTIME_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub author: String,
    #[serde(
        rename = "type",
        default = "default_category",
        deserialize_with = "crate::parsers::deserializers::deserialize_category"
    )]
    pub category: Category,
    #[serde(default)]
    pub mod_time: Option<f64>,
    #[serde(default)]
    pub analyzed_time: f64,
}

fn default_category() -> Category {
    Category::Other
}

impl CacheEntry {
    pub fn new(metadata: &ArchiveMetadata, mod_time: Option<f64>) -> Self {
        Self {
            name: metadata.name.clone(),
            author: metadata.author.clone(),
            category: metadata.category,
            mod_time,
            analyzed_time: Utc::now().timestamp_millis() as f64 / 1000.0,
        }
    }

    /// Whether this entry still describes a file with modification time `mod_time`.
    ///
    /// A missing time on either side counts as fresh, so second-granularity filesystems may
    /// miss a rapid re-edit.
    pub fn is_fresh(&self, mod_time: Option<f64>) -> bool {
        match (self.mod_time, mod_time) {
            (Some(cached), Some(current)) => (cached - current).abs() < MTIME_EPSILON,
            _ => true,
        }
    }
}
