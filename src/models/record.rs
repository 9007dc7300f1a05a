use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

/// Lightweight view of one archive on disk, as held by the registry
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveFileRecord {
    pub name: String,
    pub path: PathBuf,
    pub size_bytes: Option<u64>,
    /// Modification time in epoch seconds
    pub modified_time: Option<f64>,
}

impl ArchiveFileRecord {
    /// Build a record from a path, reading size and mtime when available.
    ///
    /// A stat failure leaves both fields as `None`; the record itself is still produced.
    pub fn from_path(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let (size_bytes, modified_time) = match fs::metadata(path) {
            Ok(meta) => (Some(meta.len()), meta.modified().ok().and_then(epoch_secs)),
            Err(e) => {
                tracing::warn!("Could not read metadata for {}: {}", path.display(), e);
                (None, None)
            }
        };

        Self { name, path: path.to_path_buf(), size_bytes, modified_time }
    }
}

fn epoch_secs(time: std::time::SystemTime) -> Option<f64> {
    time.duration_since(UNIX_EPOCH).ok().map(|d| d.as_secs_f64())
}
