//! Ordered list of archives under a root directory with a single cursor.
//!
//! The cursor always stays in `0..=len`; `cursor == len` means the list is exhausted and
//! [`ArchiveRegistry::current`] returns `None`. Only [`ArchiveRegistry::advance`] walks off the
//! end. Removing records or refreshing clamps the cursor to `len - 1`, so a non-empty list is
//! never left exhausted by a mutation.

pub mod discovery;

use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use anyhow::Result;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::marker;
use crate::models::ArchiveFileRecord;
pub use discovery::{enumerate, is_archive};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("No archive is selected")]
    NoCurrent,

    #[error("Destination already exists: {}", path.display())]
    DestinationExists { path: PathBuf },

    #[error("Failed to update {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The operation failed but the archive is gone from disk anyway; its record was dropped
    #[error("{} disappeared while it was being updated: {source}", path.display())]
    Vanished {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug)]
pub struct ArchiveRegistry {
    root: PathBuf,
    records: Vec<ArchiveFileRecord>,
    cursor: usize,
}

impl ArchiveRegistry {
    /// Enumerate `root` and position the cursor on the first archive
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let records = enumerate(&root)?;
        info!("Loaded {} archives from {}", records.len(), root.display());
        Ok(Self { root, records, cursor: 0 })
    }

    pub fn from_records(root: impl Into<PathBuf>, records: Vec<ArchiveFileRecord>) -> Self {
        Self { root: root.into(), records, cursor: 0 }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn records(&self) -> &[ArchiveFileRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current(&self) -> Option<&ArchiveFileRecord> {
        self.records.get(self.cursor)
    }

    /// Step forward. Moving off the last record exhausts the list and still returns `false`.
    pub fn advance(&mut self) -> bool {
        if self.cursor >= self.records.len() {
            return false;
        }
        self.cursor += 1;
        self.cursor < self.records.len()
    }

    /// Step back. From the exhausted position this returns to the last record.
    pub fn retreat(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        true
    }

    pub fn seek_to(&mut self, index: usize) -> bool {
        if index < self.records.len() {
            self.cursor = index;
            true
        } else {
            false
        }
    }

    pub fn seek_path(&mut self, path: &Path) -> bool {
        match self.records.iter().position(|r| r.path == path) {
            Some(index) => {
                self.cursor = index;
                true
            }
            None => false,
        }
    }

    /// Move to the first record at or after the cursor whose file name contains `query`,
    /// ignoring case. Without a match the cursor is left where it was.
    pub fn seek_name(&mut self, query: &str) -> bool {
        let needle = query.to_lowercase();
        self.seek_next(|record| record.name.to_lowercase().contains(&needle))
    }

    /// Move to the first record at or after the cursor matching `predicate`
    pub fn seek_next(&mut self, mut predicate: impl FnMut(&ArchiveFileRecord) -> bool) -> bool {
        let found = self.records.iter().enumerate().skip(self.cursor).find(|(_, r)| predicate(r)).map(|(i, _)| i);
        match found {
            Some(index) => {
                self.cursor = index;
                true
            }
            None => false,
        }
    }

    /// Move the current archive into `destination_dir`, stripping its marker first.
    ///
    /// Returns the new path. The record is removed and the cursor now points at the archive
    /// that followed it.
    pub fn move_current_to(&mut self, destination_dir: &Path) -> Result<PathBuf, RegistryError> {
        let source = self.current().ok_or(RegistryError::NoCurrent)?.path.clone();

        fs::create_dir_all(destination_dir).map_err(|e| self.fail(&source, e))?;

        let file_name = match source.file_name() {
            Some(name) => name.to_owned(),
            None => {
                let err = io::Error::new(ErrorKind::InvalidInput, "archive path has no file name");
                return Err(self.fail(&source, err));
            }
        };
        let target = destination_dir.join(file_name);
        if target.exists() {
            return Err(RegistryError::DestinationExists { path: target });
        }

        // Moved archives go back to being unsorted
        if let Err(e) = marker::delete_marker(&source) {
            warn!("Moving {} with its marker still in place: {}", source.display(), e);
        }

        move_file(&source, &target).map_err(|e| self.fail(&source, e))?;

        info!("Moved {} to {}", source.display(), target.display());
        self.remove_current();
        Ok(target)
    }

    /// Delete the current archive from disk. An archive that is already gone counts as deleted.
    pub fn delete_current(&mut self) -> Result<PathBuf, RegistryError> {
        let source = self.current().ok_or(RegistryError::NoCurrent)?.path.clone();

        match fs::remove_file(&source) {
            Ok(()) => info!("Deleted {}", source.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("{} was already removed from disk", source.display());
            }
            Err(e) => return Err(self.fail(&source, e)),
        }

        self.remove_current();
        Ok(source)
    }

    /// Re-read the root directory, keeping the cursor on the same archive when it still exists
    pub fn refresh(&mut self) -> Result<()> {
        let previous = self.current().map(|r| r.path.clone());
        self.records = enumerate(&self.root)?;

        let restored = previous.as_deref().is_some_and(|path| self.seek_path(path));
        if !restored {
            self.clamp();
        }
        debug!("Refreshed registry: {} archives, cursor at {}", self.records.len(), self.cursor);
        Ok(())
    }

    fn remove_current(&mut self) {
        if self.cursor < self.records.len() {
            self.records.remove(self.cursor);
        }
        self.clamp();
    }

    fn clamp(&mut self) {
        self.cursor = self.cursor.min(self.records.len().saturating_sub(1));
    }

    /// Turn a failed filesystem operation into an error, dropping the record if the file
    /// vanished in the meantime
    fn fail(&mut self, path: &Path, source: io::Error) -> RegistryError {
        if path.exists() {
            warn!("Operation on {} failed: {}", path.display(), source);
            RegistryError::Io { path: path.to_path_buf(), source }
        } else {
            warn!("{} vanished during a failed operation: {}", path.display(), source);
            if let Some(index) = self.records.iter().position(|r| r.path == path) {
                self.records.remove(index);
                if index < self.cursor {
                    self.cursor -= 1;
                }
            }
            self.clamp();
            RegistryError::Vanished { path: path.to_path_buf(), source }
        }
    }
}

/// Rename, falling back to copy + delete when the destination is on another filesystem
fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(rename_err) if matches!(rename_err.kind(), ErrorKind::CrossesDevices) => {
            debug!("Rename across filesystems, copying {} instead", from.display());
            copy_then_remove(from, to)
        }
        Err(rename_err) => Err(rename_err),
    }
}

/// Copy `from` to `to` and delete `from`. On failure `to` is removed again so a partial or
/// duplicate copy never stays behind.
fn copy_then_remove(from: &Path, to: &Path) -> io::Result<()> {
    let result = fs::copy(from, to).and_then(|_| fs::remove_file(from));
    if result.is_err() {
        match fs::remove_file(to) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!("Could not remove partial copy {}: {}", to.display(), e),
        }
    }
    result
}
