//! Data models shared by the classifier, registry, marker store and cache.
//!
//! - [`ArchiveMetadata`] - what classification recovered from one archive
//! - [`Category`] - Vehicle / Map / Other
//! - [`ArchiveFileRecord`] - one archive file as seen by the registry
//! - [`MarkerRecord`] - the "processed" entry persisted inside an archive

pub mod marker;
pub mod metadata;
pub mod record;

pub use marker::MarkerRecord;
pub use metadata::{ArchiveMetadata, Category, PreviewImage};
pub use record::ArchiveFileRecord;
