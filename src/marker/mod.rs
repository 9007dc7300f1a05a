//! The `.mod_sorted` marker entry stored inside triaged archives.
//!
//! A marker records that an archive has been reviewed, along with a snapshot of its
//! metadata. Writing is idempotent and never leaves a half-written archive behind: see
//! [`rewrite`] for how the archive is replaced.

pub mod rewrite;

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use zip::ZipArchive;
use zip::result::ZipError;

use crate::models::{ArchiveMetadata, MarkerRecord};
use rewrite::{AppendError, append_entry_in_place, rewrite_archive};

/// Name of the marker entry at the archive root
pub const MARKER_ENTRY_NAME: &str = ".mod_sorted";

/// Markers are tiny; anything bigger is not one of ours
const MAX_MARKER_BYTES: u64 = 1024 * 1024;

#[derive(Debug, Error)]
pub enum MarkerError {
    #[error("Failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid archive {}: {source}", path.display())]
    Zip {
        path: PathBuf,
        #[source]
        source: ZipError,
    },

    #[error("I/O error while updating {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize marker: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to replace {} with the updated archive: {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The central directory lists entries sharing a name; a rewrite would keep only one
    #[error("{} has duplicate entry names ({listed} listed, {unique} unique); refusing to rewrite", path.display())]
    DuplicateEntries { path: PathBuf, listed: usize, unique: usize },
}

/// How a new marker gets into the archive
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteStrategy {
    /// Copy to a sibling temp file and atomically replace the original
    #[default]
    Rewrite,
    /// Append in place, falling back to a rewrite when that is not possible
    Append,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerOutcome {
    Written,
    AlreadyMarked,
    Removed,
    NotMarked,
}

/// Marker writer carrying the configured [`WriteStrategy`]
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkerStore {
    strategy: WriteStrategy,
}

impl MarkerStore {
    pub fn new(strategy: WriteStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> WriteStrategy {
        self.strategy
    }

    pub fn has_marker(&self, path: &Path) -> bool {
        has_marker(path)
    }

    pub fn read_marker(&self, path: &Path) -> Option<MarkerRecord> {
        read_marker(path)
    }

    /// Mark `path` as reviewed. Returns [`MarkerOutcome::AlreadyMarked`] without touching the
    /// file when a marker is already present.
    pub fn write_marker(&self, path: &Path, metadata: &ArchiveMetadata) -> Result<MarkerOutcome, MarkerError> {
        if has_marker(path) {
            debug!("{} already has a marker", path.display());
            return Ok(MarkerOutcome::AlreadyMarked);
        }

        let record = MarkerRecord::from_metadata(metadata);
        let bytes = serde_json::to_vec(&record)?;

        let result = match self.strategy {
            WriteStrategy::Rewrite => rewrite_archive(path, Some(&bytes)),
            WriteStrategy::Append => match append_entry_in_place(path, &bytes) {
                Ok(()) => Ok(()),
                Err(AppendError::NotViable(reason)) => {
                    debug!("Append not viable for {} ({}), rewriting", path.display(), reason);
                    rewrite_archive(path, Some(&bytes))
                }
                Err(AppendError::Failed(e)) => {
                    warn!("Append failed for {}: {}; retrying with a rewrite", path.display(), e);
                    rewrite_archive(path, Some(&bytes))
                }
            },
        };

        match result {
            Ok(()) => {
                info!("Marked {} as sorted", path.display());
                Ok(MarkerOutcome::Written)
            }
            Err(e) => {
                warn!("Could not mark {}: {}", path.display(), e);
                Err(e)
            }
        }
    }

    pub fn delete_marker(&self, path: &Path) -> Result<MarkerOutcome, MarkerError> {
        delete_marker(path)
    }
}

fn open_archive(path: &Path) -> Result<ZipArchive<BufReader<File>>, MarkerError> {
    let file = File::open(path).map_err(|source| MarkerError::Open { path: path.to_path_buf(), source })?;
    ZipArchive::new(BufReader::new(file)).map_err(|source| MarkerError::Zip { path: path.to_path_buf(), source })
}

/// Whether the archive carries a marker entry. Unreadable archives count as unmarked.
pub fn has_marker(path: &Path) -> bool {
    match open_archive(path) {
        Ok(archive) => archive.index_for_name(MARKER_ENTRY_NAME).is_some(),
        Err(e) => {
            warn!("Could not check marker in {}: {}", path.display(), e);
            false
        }
    }
}

/// Parse the marker entry, if there is a readable one
pub fn read_marker(path: &Path) -> Option<MarkerRecord> {
    let mut archive = match open_archive(path) {
        Ok(archive) => archive,
        Err(e) => {
            warn!("Could not read marker from {}: {}", path.display(), e);
            return None;
        }
    };

    let entry = match archive.by_name(MARKER_ENTRY_NAME) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => return None,
        Err(e) => {
            warn!("Could not read marker from {}: {}", path.display(), e);
            return None;
        }
    };

    let mut bytes = Vec::new();
    if let Err(e) = entry.take(MAX_MARKER_BYTES).read_to_end(&mut bytes) {
        warn!("Could not read marker from {}: {}", path.display(), e);
        return None;
    }

    match serde_json::from_slice::<MarkerRecord>(&bytes) {
        Ok(record) => Some(record),
        Err(e) => {
            warn!("Ignoring malformed marker in {}: {}", path.display(), e);
            None
        }
    }
}

/// Remove every marker entry. A no-op returning [`MarkerOutcome::NotMarked`] when there is none.
pub fn delete_marker(path: &Path) -> Result<MarkerOutcome, MarkerError> {
    if !has_marker(path) {
        return Ok(MarkerOutcome::NotMarked);
    }

    match rewrite_archive(path, None) {
        Ok(()) => {
            info!("Removed marker from {}", path.display());
            Ok(MarkerOutcome::Removed)
        }
        Err(e) => {
            warn!("Could not remove marker from {}: {}", path.display(), e);
            Err(e)
        }
    }
}
