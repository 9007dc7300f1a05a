use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Content category an archive was classified into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Vehicle,
    Map,
    Other,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Vehicle, Category::Map, Category::Other];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Vehicle => "Vehicle",
            Self::Map => "Map",
            Self::Other => "Other",
        }
    }

    /// Case-insensitive lookup; anything unrecognised is `None`
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One preview image pulled out of an archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewImage {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl PreviewImage {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self { name: name.into(), bytes }
    }
}

/// Result of classifying a single archive.
///
/// Built fresh by every [`classify`](crate::classifier::classify) call and never mutated
/// afterwards. `preview_images` keeps insertion order and a `default` image, when present,
/// is always first.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveMetadata {
    pub name: String,
    pub author: String,
    pub category: Category,
    pub description: String,
    pub preview_images: Vec<PreviewImage>,
    pub additional_info: Map<String, Value>,
}

impl ArchiveMetadata {
    /// Pretty JSON rendering of `additional_info` for display
    pub fn additional_info_pretty(&self) -> String {
        serde_json::to_string_pretty(&self.additional_info).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn image_names(&self) -> Vec<&str> {
        self.preview_images.iter().map(|img| img.name.as_str()).collect()
    }
}
