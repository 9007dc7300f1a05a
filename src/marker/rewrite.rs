//! Safe mutation of an archive's entry list.
//!
//! [`rewrite_archive`] copies every entry except the marker into a temporary archive in the
//! same directory, optionally adds a fresh marker, closes both archives and only then renames
//! the temporary file over the original. Any failure before the rename drops the
//! [`tempfile::NamedTempFile`], which deletes it, so the original is never touched. Archives
//! whose central directory lists the same name twice are refused, since the reader keys
//! entries by name and a rewrite would silently drop the duplicates.
//!
//! [`append_entry_in_place`] is the cheaper path: the new entry is written where the central
//! directory used to be. The bytes from that point to the end of the file are saved first and
//! written back if the append fails.

use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, Read, Seek, SeekFrom, Write};
use std::path::Path;

use zip::result::ZipResult;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::{MARKER_ENTRY_NAME, MarkerError};

/// End of central directory signature
const EOCD_SIGNATURE: &[u8; 4] = b"PK\x05\x06";
const EOCD_MIN_LEN: u64 = 22;
/// Fixed EOCD record plus the largest possible comment
const EOCD_SEARCH_LEN: u64 = EOCD_MIN_LEN + u16::MAX as u64;

fn marker_options() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
}

/// Rebuild `path` without any marker entry, adding `marker` as the new one when given
pub fn rewrite_archive(path: &Path, marker: Option<&[u8]>) -> Result<(), MarkerError> {
    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let io_err = |source| MarkerError::Io { path: path.to_path_buf(), source };
    let zip_err = |source| MarkerError::Zip { path: path.to_path_buf(), source };

    let mut temp = tempfile::Builder::new()
        .prefix(".mod-triage-")
        .suffix(".zip.tmp")
        .tempfile_in(parent)
        .map_err(io_err)?;

    {
        let mut source_file =
            File::open(path).map_err(|source| MarkerError::Open { path: path.to_path_buf(), source })?;
        let listed = listed_entry_count(&mut source_file);
        let mut source = ZipArchive::new(BufReader::new(source_file)).map_err(zip_err)?;
        if let Some(listed) = listed {
            if listed != source.len() {
                return Err(MarkerError::DuplicateEntries { path: path.to_path_buf(), listed, unique: source.len() });
            }
        }
        let mut writer = ZipWriter::new(temp.as_file_mut());

        for i in 0..source.len() {
            let entry = source.by_index_raw(i).map_err(zip_err)?;
            if entry.name() == MARKER_ENTRY_NAME {
                continue;
            }
            writer.raw_copy_file(entry).map_err(zip_err)?;
        }

        if let Some(bytes) = marker {
            writer.start_file(MARKER_ENTRY_NAME, marker_options()).map_err(zip_err)?;
            writer.write_all(bytes).map_err(io_err)?;
        }

        writer.finish().map_err(zip_err)?;
        // source reader and writer are both closed at the end of this scope
    }

    temp.as_file().sync_all().map_err(io_err)?;
    match fs::metadata(path) {
        Ok(meta) => {
            if let Err(e) = fs::set_permissions(temp.path(), meta.permissions()) {
                tracing::warn!("Could not copy permissions onto rewritten {}: {}", path.display(), e);
            }
        }
        Err(e) => tracing::warn!("Could not read permissions of {}: {}", path.display(), e),
    }

    temp.persist(path).map_err(|e| MarkerError::Persist { path: path.to_path_buf(), source: e.error })?;
    Ok(())
}

/// Why an in-place append could not even be attempted
#[derive(Debug)]
pub enum AppendError {
    /// The archive layout is not suitable (no EOCD found, ZIP64); nothing was written
    NotViable(String),
    /// The append was attempted and failed; the original bytes were restored
    Failed(MarkerError),
}

/// Append `marker` as a new entry without rewriting existing entries
pub fn append_entry_in_place(path: &Path, marker: &[u8]) -> Result<(), AppendError> {
    let io_failed = |source| AppendError::Failed(MarkerError::Io { path: path.to_path_buf(), source });

    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .map_err(|source| AppendError::Failed(MarkerError::Open { path: path.to_path_buf(), source }))?;
    let original_len = file.metadata().map_err(io_failed)?.len();

    let tail_start = central_directory_offset(&mut file, original_len).map_err(AppendError::NotViable)?;
    let mut tail = Vec::with_capacity((original_len - tail_start) as usize);
    file.seek(SeekFrom::Start(tail_start)).map_err(io_failed)?;
    file.read_to_end(&mut tail).map_err(io_failed)?;
    file.seek(SeekFrom::Start(0)).map_err(io_failed)?;

    match write_appended(&mut file, marker).and_then(|_| file.sync_all().map_err(Into::into)) {
        Ok(()) => Ok(()),
        Err(append_err) => {
            tracing::warn!("Append to {} failed, restoring original bytes: {}", path.display(), append_err);
            restore_tail(&mut file, tail_start, &tail).map_err(io_failed)?;
            Err(AppendError::Failed(MarkerError::Zip { path: path.to_path_buf(), source: append_err }))
        }
    }
}

fn write_appended(file: &mut File, marker: &[u8]) -> ZipResult<()> {
    let mut writer = ZipWriter::new_append(&mut *file)?;
    writer.start_file(MARKER_ENTRY_NAME, marker_options())?;
    writer.write_all(marker)?;
    writer.finish()?;
    Ok(())
}

fn restore_tail(file: &mut File, tail_start: u64, tail: &[u8]) -> std::io::Result<()> {
    file.set_len(tail_start)?;
    file.seek(SeekFrom::Start(tail_start))?;
    file.write_all(tail)?;
    file.sync_all()
}

/// Fields of the end-of-central-directory record we rely on
struct EndRecord {
    total_entries: u16,
    directory_offset: u32,
}

fn read_end_record(file: &mut File, len: u64) -> Result<EndRecord, String> {
    if len < EOCD_MIN_LEN {
        return Err(format!("file too short for a zip archive ({} bytes)", len));
    }
    let search_len = len.min(EOCD_SEARCH_LEN);
    let mut buf = vec![0u8; search_len as usize];
    file.seek(SeekFrom::Start(len - search_len)).map_err(|e| e.to_string())?;
    file.read_exact(&mut buf).map_err(|e| e.to_string())?;

    let last_start = buf.len() - EOCD_MIN_LEN as usize;
    let pos = (0..=last_start)
        .rev()
        .find(|&i| &buf[i..i + 4] == EOCD_SIGNATURE)
        .ok_or_else(|| "end of central directory record not found".to_string())?;

    Ok(EndRecord {
        total_entries: u16::from_le_bytes([buf[pos + 10], buf[pos + 11]]),
        directory_offset: u32::from_le_bytes([buf[pos + 16], buf[pos + 17], buf[pos + 18], buf[pos + 19]]),
    })
}

/// Number of entries the central directory claims, when it can be read without ZIP64
fn listed_entry_count(file: &mut File) -> Option<usize> {
    let len = file.metadata().ok()?.len();
    let record = read_end_record(file, len).ok()?;
    (record.total_entries != u16::MAX).then_some(usize::from(record.total_entries))
}

/// Offset where the central directory starts, read from the end-of-central-directory record.
///
/// For archives with leading data the real directory sits later than the recorded offset,
/// so the returned value is a safe lower bound for what an append will overwrite.
fn central_directory_offset(file: &mut File, len: u64) -> Result<u64, String> {
    let offset = read_end_record(file, len)?.directory_offset;
    if offset == u32::MAX {
        return Err("ZIP64 archives are rewritten instead of appended".to_string());
    }
    Ok(u64::from(offset).min(len))
}
