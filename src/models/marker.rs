use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{ArchiveMetadata, Category};

/// Contents of the "already processed" entry stored inside an archive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerRecord {
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
    #[serde(
        default,
        deserialize_with = "crate::parsers::deserializers::deserialize_optional_timestamp"
    )]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_info: Option<Map<String, Value>>,
}

fn default_category() -> Category {
    Category::Other
}

impl MarkerRecord {
    /// Compact marker for `metadata`, stamped with the current time
    pub fn from_metadata(metadata: &ArchiveMetadata) -> Self {
        Self {
            name: metadata.name.clone(),
            author: metadata.author.clone(),
            category: metadata.category,
            timestamp: Some(Utc::now()),
            additional_info: None,
        }
    }

    /// Same as [`from_metadata`](Self::from_metadata) but keeps the full `additional_info`
    pub fn with_additional_info(metadata: &ArchiveMetadata) -> Self {
        Self { additional_info: Some(metadata.additional_info.clone()), ..Self::from_metadata(metadata) }
    }
}
