//! Triage driver tying the registry, classifier, marker store and result cache together.
//!
//! Each operation acts on the registry's current archive and leaves the cursor on the next
//! archive to review. With `skip_marked` enabled, archives that already carry a marker are
//! stepped over when moving forward.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tracing::{debug, info, warn};

use crate::classifier::classify;
use crate::config::Settings;
use crate::marker::{MarkerOutcome, MarkerStore};
use crate::models::{ArchiveFileRecord, ArchiveMetadata, Category, MarkerRecord};
use crate::registry::ArchiveRegistry;
use crate::result_cache::{CacheEntry, ResultCache};

#[derive(Debug)]
pub struct TriageSession {
    registry: ArchiveRegistry,
    settings: Settings,
    markers: MarkerStore,
    cache: Option<ResultCache>,
}

impl TriageSession {
    pub fn new(registry: ArchiveRegistry, settings: Settings, cache: Option<ResultCache>) -> Self {
        let markers = MarkerStore::new(settings.marker_strategy);
        let mut session = Self { registry, settings, markers, cache };
        session.skip_marked_forward();
        session
    }

    pub fn registry(&self) -> &ArchiveRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn current(&self) -> Option<&ArchiveFileRecord> {
        self.registry.current()
    }

    /// 1-based position of the current archive and the total count
    pub fn progress(&self) -> (usize, usize) {
        let total = self.registry.len();
        ((self.registry.cursor() + 1).min(total), total)
    }

    /// Classify the current archive, refreshing its cache entry
    pub fn current_metadata(&mut self) -> Option<ArchiveMetadata> {
        let record = self.registry.current()?.clone();
        let metadata = classify(&record.path);
        self.remember(&record, &metadata);
        Some(metadata)
    }

    /// Marker stored in the current archive, if it has one
    pub fn marker_snapshot(&self) -> Option<MarkerRecord> {
        self.registry.current().and_then(|record| self.markers.read_marker(&record.path))
    }

    pub fn is_current_marked(&self) -> bool {
        self.registry.current().is_some_and(|record| self.markers.has_marker(&record.path))
    }

    /// Cached summary for `record`, classifying it when the cache has nothing fresh
    pub fn summary(&mut self, record: &ArchiveFileRecord) -> CacheEntry {
        if let Some(entry) = self.cache.as_ref().and_then(|c| c.get(&record.name, record.modified_time)) {
            return entry.clone();
        }
        let metadata = classify(&record.path);
        self.remember(record, &metadata);
        self.cache
            .as_ref()
            .and_then(|c| c.get(&record.name, record.modified_time))
            .cloned()
            .unwrap_or_else(|| CacheEntry::new(&metadata, record.modified_time))
    }

    /// Mark the current archive as reviewed and move on
    pub fn keep_current(&mut self) -> Result<MarkerOutcome> {
        let record = self.registry.current().cloned().ok_or_else(|| anyhow!("No archive is selected"))?;
        let metadata = classify(&record.path);
        let outcome = self
            .markers
            .write_marker(&record.path, &metadata)
            .with_context(|| format!("Failed to mark {}", record.name))?;

        // The marker changed the file, so record it against the new mtime
        let updated = ArchiveFileRecord::from_path(&record.path);
        self.remember(&updated, &metadata);
        self.skip();
        Ok(outcome)
    }

    /// Step to the next archive to review; `false` once the list is exhausted
    pub fn skip(&mut self) -> bool {
        self.registry.advance();
        self.skip_marked_forward();
        self.registry.current().is_some()
    }

    pub fn previous(&mut self) -> bool {
        self.registry.retreat()
    }

    /// Move the current archive into `destination_dir` and return its new path
    pub fn move_current(&mut self, destination_dir: &Path) -> Result<PathBuf> {
        let name = self.registry.current().map(|r| r.name.clone());
        let result = self.registry.move_current_to(destination_dir);
        if let Some(name) = &name {
            if !self.current_name_is(name) {
                self.forget(name);
            }
        }
        let target = result?;
        self.skip_marked_forward();
        Ok(target)
    }

    /// Move the current archive to the configured folder matching `query` by key or name
    pub fn move_to_shortcut(&mut self, query: &str) -> Result<PathBuf> {
        let folder = self
            .settings
            .find_move_folder(query)
            .ok_or_else(|| anyhow!("No move folder named '{}' is configured", query))?;
        let destination = folder.resolve(self.registry.root());
        info!("Moving to '{}' ({})", folder.name, destination.display());
        self.move_current(&destination)
    }

    pub fn delete_current(&mut self) -> Result<PathBuf> {
        let name = self.registry.current().map(|r| r.name.clone());
        let result = self.registry.delete_current();
        if let Some(name) = &name {
            if !self.current_name_is(name) {
                self.forget(name);
            }
        }
        let deleted = result?;
        self.skip_marked_forward();
        Ok(deleted)
    }

    /// Advance to the first archive at or after the cursor classified as `category`.
    /// Without a match the cursor ends up exhausted.
    pub fn seek_category(&mut self, category: Category) -> bool {
        while let Some(record) = self.registry.current().cloned() {
            if self.summary(&record).category == category {
                debug!("Found {} archive {}", category, record.name);
                return true;
            }
            self.registry.advance();
        }
        info!("No more archives of type {}", category);
        false
    }

    pub fn seek_to(&mut self, index: usize) -> bool {
        self.registry.seek_to(index)
    }

    pub fn seek_name(&mut self, query: &str) -> bool {
        self.registry.seek_name(query)
    }

    pub fn refresh(&mut self) -> Result<()> {
        self.registry.refresh()
    }

    fn skip_marked_forward(&mut self) {
        if !self.settings.skip_marked {
            return;
        }
        let markers = self.markers;
        let skipped = self.registry.seek_next(|record| !markers.has_marker(&record.path));
        if !skipped {
            // Everything left is already sorted
            while self.registry.advance() {}
        }
    }

    fn current_name_is(&self, name: &str) -> bool {
        self.registry.current().is_some_and(|r| r.name == name)
    }

    fn remember(&mut self, record: &ArchiveFileRecord, metadata: &ArchiveMetadata) {
        if let Some(cache) = self.cache.as_mut() {
            if let Err(e) = cache.update(&record.name, record.modified_time, metadata) {
                warn!("Failed to update cache for {}: {:#}", record.name, e);
            }
        }
    }

    fn forget(&mut self, name: &str) {
        if let Some(cache) = self.cache.as_mut() {
            if let Err(e) = cache.remove(name) {
                warn!("Failed to update cache after removing {}: {:#}", name, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs::{self, File};
    use std::io::Write;

    use tempfile::TempDir;
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    use super::*;
    use crate::config::MoveFolder;
    use crate::marker::has_marker;

    fn write_zip(path: &Path, entries: &[(&str, &str)]) {
        let mut writer = ZipWriter::new(File::create(path).unwrap());
        for (name, data) in entries {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(data.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
    }

    /// a.zip is a vehicle, b.zip a map, c.zip has no metadata
    fn setup(settings: Settings) -> (TempDir, TriageSession) {
        let dir = TempDir::new().unwrap();
        let mods = dir.path().join("mods");
        fs::create_dir(&mods).unwrap();
        write_zip(&mods.join("a.zip"), &[("vehicles/pickup/info.json", r#"{"Name": "Pickup", "Author": "A"}"#)]);
        write_zip(&mods.join("b.zip"), &[("levels/track/info.json", r#"{"title": "Track", "authors": "B"}"#)]);
        write_zip(&mods.join("c.zip"), &[("readme.txt", "hi")]);

        let cache = ResultCache::load(dir.path().join("cache.json"));
        let registry = ArchiveRegistry::open(&mods).unwrap();
        (dir, TriageSession::new(registry, settings, Some(cache)))
    }

    fn current_name(session: &TriageSession) -> Option<String> {
        session.current().map(|r| r.name.clone())
    }

    #[test]
    fn test_keep_marks_and_advances() {
        let (_dir, mut session) = setup(Settings::default());
        let first = session.current().unwrap().path.clone();

        assert_eq!(session.keep_current().unwrap(), MarkerOutcome::Written);
        assert!(has_marker(&first));
        assert_eq!(current_name(&session).as_deref(), Some("b.zip"));
    }

    #[test]
    fn test_skip_marked_steps_over_sorted_archives() {
        let (_dir, mut session) = setup(Settings::default());
        session.keep_current().unwrap();
        session.keep_current().unwrap();

        let settings = Settings { skip_marked: true, ..Settings::default() };
        let registry = ArchiveRegistry::open(session.registry().root()).unwrap();
        let session = TriageSession::new(registry, settings, None);
        assert_eq!(current_name(&session).as_deref(), Some("c.zip"));
    }

    #[test]
    fn test_seek_category() {
        let (_dir, mut session) = setup(Settings::default());

        assert!(session.seek_category(Category::Map));
        assert_eq!(current_name(&session).as_deref(), Some("b.zip"));
        assert!(session.seek_category(Category::Other));
        assert_eq!(current_name(&session).as_deref(), Some("c.zip"));
        assert!(!session.seek_category(Category::Vehicle));
        assert!(session.current().is_none());
    }

    #[test]
    fn test_move_to_shortcut_strips_marker_and_updates_cache() {
        let settings = Settings {
            move_folders: vec![MoveFolder { name: "Cars".into(), path: "sorted/cars".into(), key: Some("c".into()) }],
            ..Settings::default()
        };
        let (_dir, mut session) = setup(settings);
        let path = session.current().unwrap().path.clone();
        session.markers.write_marker(&path, &classify(&path)).unwrap();
        session.current_metadata();

        let moved = session.move_to_shortcut("c").unwrap();
        assert_eq!(moved, session.registry().root().join("sorted/cars/a.zip"));
        assert!(!has_marker(&moved));
        assert!(session.cache.as_ref().unwrap().get("a.zip", None).is_none());
        assert_eq!(current_name(&session).as_deref(), Some("b.zip"));

        assert!(session.move_to_shortcut("maps").is_err());
    }

    #[test]
    fn test_delete_current() {
        let (_dir, mut session) = setup(Settings::default());
        let deleted = session.delete_current().unwrap();
        assert!(!deleted.exists());
        assert_eq!(session.progress(), (1, 2));
    }

    #[test]
    fn test_summary_uses_cache() {
        let (_dir, mut session) = setup(Settings::default());
        let record = session.current().unwrap().clone();

        let first = session.summary(&record);
        assert_eq!(first.category, Category::Vehicle);
        assert!(session.cache.as_ref().unwrap().is_analyzed("a.zip", record.modified_time));
        assert_eq!(session.summary(&record).analyzed_time, first.analyzed_time);
    }
}
