use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use zip::ZipArchive;

use crate::models::PreviewImage;

/// Maximum size of a preview image we load into memory: 32MB
pub const MAX_IMAGE_BYTES: u64 = 32 * 1024 * 1024;

/// Extensions (lower-case, without dot) treated as preview images
pub const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// An opened archive plus its entry-name table in central-directory order
pub struct ArchiveContents<R> {
    path: PathBuf,
    archive: ZipArchive<R>,
    names: Vec<String>,
}

impl ArchiveContents<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open archive: {}", path.display()))?;
        let archive = ZipArchive::new(BufReader::new(file))
            .with_context(|| format!("Invalid zip file: {}", path.display()))?;
        Ok(Self::from_archive(path, archive))
    }
}

impl<R: Read + Seek> ArchiveContents<R> {
    pub fn from_archive(path: &Path, archive: ZipArchive<R>) -> Self {
        let names = (0..archive.len())
            .filter_map(|i| archive.name_for_index(i).map(str::to_owned))
            .collect();
        Self { path: path.to_path_buf(), archive, names }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Read one entry fully, refusing entries larger than `limit`
    pub fn read_entry(&mut self, name: &str, limit: u64) -> Result<Vec<u8>> {
        let entry = self
            .archive
            .by_name(name)
            .with_context(|| format!("Failed to open entry {} in {}", name, self.path.display()))?;
        if entry.size() > limit {
            bail!("Entry too large: {} ({} bytes, max {} bytes)", name, entry.size(), limit);
        }

        let mut buf = Vec::with_capacity(entry.size() as usize);
        entry
            .take(limit + 1)
            .read_to_end(&mut buf)
            .with_context(|| format!("Failed to read entry {} in {}", name, self.path.display()))?;
        if buf.len() as u64 > limit {
            bail!("Entry too large: {} (more than {} bytes)", name, limit);
        }
        Ok(buf)
    }

    /// Load an image entry under the display name `label`; failures are logged and skipped
    pub fn read_image(&mut self, name: &str, label: &str) -> Option<PreviewImage> {
        match self.read_entry(name, MAX_IMAGE_BYTES) {
            Ok(bytes) => {
                tracing::debug!("Found image {} with {} bytes", name, bytes.len());
                Some(PreviewImage::new(label, bytes))
            }
            Err(e) => {
                tracing::warn!("Could not load image {}: {:#}", name, e);
                None
            }
        }
    }

    /// Archive filename without its extension, used as a last-resort display name
    pub fn display_stem(&self) -> String {
        archive_stem(&self.path)
    }
}

pub fn archive_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Unknown Mod".to_string())
}

/// Directory part of an entry name (`""` for top-level entries)
pub fn dir_of(name: &str) -> &str {
    name.trim_end_matches('/').rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

/// Final component of an entry name
pub fn file_name_of(name: &str) -> &str {
    name.trim_end_matches('/').rsplit('/').next().unwrap_or(name)
}

/// Join an entry directory and a relative name, normalising `\`, `./` and a leading `/`
pub fn join_entry(dir: &str, relative: &str) -> String {
    let normalized = relative.replace('\\', "/");
    let relative = normalized.trim_start_matches("./");
    if let Some(absolute) = relative.strip_prefix('/') {
        return absolute.to_string();
    }
    if dir.is_empty() { relative.to_string() } else { format!("{}/{}", dir, relative) }
}

/// Split a file name into stem and lower-cased extension
pub fn split_extension(file_name: &str) -> (&str, Option<String>) {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext.to_ascii_lowercase())),
        _ => (file_name, None),
    }
}

pub fn is_image(name: &str) -> bool {
    split_extension(file_name_of(name))
        .1
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

/// Whether any directory segment of `name` equals `segment` (ASCII case-insensitive)
pub fn has_dir_segment(name: &str, segment: &str) -> bool {
    let dir = dir_of(name);
    !dir.is_empty() && dir.split('/').any(|part| part.eq_ignore_ascii_case(segment))
}
