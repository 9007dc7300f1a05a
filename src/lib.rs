//! Mod Triage - classify, mark and sort game mod archives
//!
//! This library inspects a folder of ZIP mod archives and helps review them one at a time:
//!
//! - Classifying each archive as a vehicle, a map or something else from its embedded
//!   `info.json`, tolerating malformed metadata
//! - Walking the archives with a cursor and moving or deleting the current one
//! - Recording that an archive has been reviewed with a marker entry stored inside it
//! - Caching classification results keyed by file name and modification time
//!
//! # Example
//!
//! ```no_run
//! use mod_triage::{ArchiveRegistry, classify};
//!
//! let registry = ArchiveRegistry::open("/games/BeamNG.drive/mods")?;
//! for record in registry.records() {
//!     let metadata = classify(&record.path);
//!     println!("{}: {} ({})", record.name, metadata.name, metadata.category);
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod classifier;
pub mod cli;
pub mod config;
pub mod logging;
pub mod marker;
pub mod models;
pub mod parsers;
pub mod registry;
pub mod result_cache;
pub mod session;
pub mod utils;

// Re-export commonly used types
pub use classifier::classify;
pub use config::{MoveFolder, Settings};
pub use marker::{MarkerOutcome, MarkerStore, WriteStrategy, delete_marker, has_marker, read_marker};
pub use models::{ArchiveFileRecord, ArchiveMetadata, Category, MarkerRecord, PreviewImage};
pub use registry::{ArchiveRegistry, RegistryError, enumerate};
pub use result_cache::ResultCache;
pub use session::TriageSession;
