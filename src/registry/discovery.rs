use std::path::Path;

use anyhow::{Result, bail};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::models::ArchiveFileRecord;

/// File extension of the archives being triaged
pub const ARCHIVE_EXTENSION: &str = "zip";

/// Recursively list every archive under `root`, sorted by file name (case-insensitive).
///
/// Entries that cannot be visited are logged and skipped. Archives whose size or mtime cannot
/// be read are still listed with those fields empty.
///
/// # Errors
///
/// Returns an error only when `root` itself is missing or not a directory.
pub fn enumerate(root: &Path) -> Result<Vec<ArchiveFileRecord>> {
    if !root.is_dir() {
        bail!("Mods directory does not exist or is not a directory: {}", root.display());
    }

    let mut records: Vec<ArchiveFileRecord> = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && is_archive(entry.path()))
        .map(|entry| ArchiveFileRecord::from_path(entry.path()))
        .collect();

    records.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()).then_with(|| a.path.cmp(&b.path)));
    debug!("Found {} archives under {}", records.len(), root.display());
    Ok(records)
}

pub fn is_archive(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case(ARCHIVE_EXTENSION))
}
