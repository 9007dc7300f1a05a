use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use rayon::prelude::*;
use serde_json::json;
use tracing::warn;

use super::render::{details_json, render_details, render_row};
use super::triage::run_triage;
use crate::classifier::classify;
use crate::config::Settings;
use crate::marker::{MarkerOutcome, MarkerStore, delete_marker, has_marker, read_marker};
use crate::models::{ArchiveFileRecord, Category};
use crate::registry::{ArchiveRegistry, enumerate};
use crate::result_cache::{CacheEntry, ResultCache, default_cache_path};
use crate::session::TriageSession;
use crate::utils::{config_path, format_path_with_tilde, resolve_root_dir};

pub fn load_settings(explicit: Option<&Path>) -> Result<Settings> {
    match explicit.map(Path::to_path_buf).or_else(config_path) {
        Some(path) => Settings::load(&path),
        None => Ok(Settings::default()),
    }
}

fn open_cache(settings: &Settings) -> Option<ResultCache> {
    let path = match &settings.cache_file {
        Some(path) => path.clone(),
        None => match default_cache_path() {
            Ok(path) => path,
            Err(e) => {
                warn!("Result cache disabled: {:#}", e);
                return None;
            }
        },
    };
    Some(ResultCache::load(path))
}

fn existing_record(archive: &Path) -> Result<ArchiveFileRecord> {
    if !archive.is_file() {
        bail!("Archive not found: {}", archive.display());
    }
    Ok(ArchiveFileRecord::from_path(archive))
}

struct ScanRow {
    record: ArchiveFileRecord,
    summary: CacheEntry,
    marked: bool,
    fresh: bool,
}

pub fn scan(
    dir: Option<PathBuf>,
    settings: &Settings,
    category: Option<Category>,
    unsorted: bool,
    json_output: bool,
) -> Result<()> {
    let root = resolve_root_dir(dir)?;
    let records = enumerate(&root)?;
    let mut cache = open_cache(settings);

    let cached: Vec<Option<CacheEntry>> = records
        .iter()
        .map(|r| cache.as_ref().and_then(|c| c.get(&r.name, r.modified_time)).cloned())
        .collect();

    // Archives are independent, so classify cache misses in parallel
    let rows: Vec<ScanRow> = records
        .into_par_iter()
        .zip(cached.into_par_iter())
        .map(|(record, cached)| {
            let marked = has_marker(&record.path);
            match cached {
                Some(summary) => ScanRow { record, summary, marked, fresh: false },
                None => {
                    let metadata = classify(&record.path);
                    let summary = CacheEntry::new(&metadata, record.modified_time);
                    ScanRow { record, summary, marked, fresh: true }
                }
            }
        })
        .collect();

    if let Some(cache) = cache.as_mut() {
        let mut changed = false;
        for row in rows.iter().filter(|row| row.fresh) {
            cache.insert(&row.record.name, row.summary.clone());
            changed = true;
        }
        if changed {
            if let Err(e) = cache.save() {
                warn!("Failed to save result cache: {:#}", e);
            }
        }
    }

    let selected: Vec<&ScanRow> = rows
        .iter()
        .filter(|row| category.is_none_or(|c| row.summary.category == c))
        .filter(|row| !unsorted || !row.marked)
        .collect();

    if json_output {
        let items: Vec<_> = selected
            .iter()
            .map(|row| {
                json!({
                    "file": row.record.name,
                    "path": row.record.path,
                    "size_bytes": row.record.size_bytes,
                    "modified_time": row.record.modified_time,
                    "name": row.summary.name,
                    "author": row.summary.author,
                    "type": row.summary.category,
                    "sorted": row.marked,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    println!("Mods directory: {}", format_path_with_tilde(&root));
    println!();
    for row in &selected {
        println!("{}", render_row(&row.record, row.summary.category, &row.summary.name, row.marked));
    }

    let count = |c: Category| rows.iter().filter(|row| row.summary.category == c).count();
    println!();
    println!(
        "{} archives ({} vehicles, {} maps, {} other), {} sorted",
        rows.len(),
        count(Category::Vehicle),
        count(Category::Map),
        count(Category::Other),
        rows.iter().filter(|row| row.marked).count()
    );
    Ok(())
}

pub fn inspect(archive: &Path, json_output: bool) -> Result<()> {
    let record = existing_record(archive)?;
    let metadata = classify(archive);
    let marker = read_marker(archive);

    if json_output {
        println!("{}", serde_json::to_string_pretty(&details_json(&record, &metadata, marker.as_ref()))?);
    } else {
        print!("{}", render_details(&record, &metadata, marker.as_ref()));
    }
    Ok(())
}

pub fn keep(archive: &Path, settings: &Settings) -> Result<()> {
    let record = existing_record(archive)?;
    let metadata = classify(archive);
    let outcome = MarkerStore::new(settings.marker_strategy)
        .write_marker(archive, &metadata)
        .with_context(|| format!("Failed to mark {}", archive.display()))?;

    match outcome {
        MarkerOutcome::AlreadyMarked => println!("{} is already marked as sorted", record.name),
        _ => {
            println!("Marked {} ({}) as sorted", record.name, metadata.category);
            if let Some(mut cache) = open_cache(settings) {
                let updated = ArchiveFileRecord::from_path(archive);
                if let Err(e) = cache.update(&updated.name, updated.modified_time, &metadata) {
                    warn!("Failed to update result cache: {:#}", e);
                }
            }
        }
    }
    Ok(())
}

pub fn unmark(archive: &Path) -> Result<()> {
    let record = existing_record(archive)?;
    match delete_marker(archive).with_context(|| format!("Failed to unmark {}", archive.display()))? {
        MarkerOutcome::Removed => println!("Removed marker from {}", record.name),
        _ => println!("{} has no marker", record.name),
    }
    Ok(())
}

pub fn show_marker(archive: &Path) -> Result<()> {
    let record = existing_record(archive)?;
    match read_marker(archive) {
        Some(marker) => println!("{}", serde_json::to_string_pretty(&marker)?),
        None if has_marker(archive) => println!("{} has a marker that could not be read", record.name),
        None => println!("{} is not marked", record.name),
    }
    Ok(())
}

pub fn move_archive(archive: &Path, destination: &str, root: Option<PathBuf>, settings: &Settings) -> Result<()> {
    let record = existing_record(archive)?;
    let root = root
        .or_else(|| archive.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."));

    let destination_dir = match settings.find_move_folder(destination) {
        Some(folder) => folder.resolve(&root),
        None => PathBuf::from(destination),
    };

    let name = record.name.clone();
    let mut registry = ArchiveRegistry::from_records(root, vec![record]);
    let target = registry.move_current_to(&destination_dir)?;

    if let Some(mut cache) = open_cache(settings) {
        if let Err(e) = cache.remove(&name) {
            warn!("Failed to update result cache: {:#}", e);
        }
    }
    println!("Moved {} to {}", name, format_path_with_tilde(&target));
    Ok(())
}

pub fn delete(archive: &Path, yes: bool, settings: &Settings) -> Result<()> {
    let record = existing_record(archive)?;
    if !yes && !confirm(&format!("Delete {}? [y/N] ", record.name))? {
        println!("Cancelled");
        return Ok(());
    }

    let name = record.name.clone();
    let root = archive.parent().map(Path::to_path_buf).unwrap_or_default();
    let mut registry = ArchiveRegistry::from_records(root, vec![record]);
    registry.delete_current()?;

    if let Some(mut cache) = open_cache(settings) {
        if let Err(e) = cache.remove(&name) {
            warn!("Failed to update result cache: {:#}", e);
        }
    }
    println!("Deleted {}", name);
    Ok(())
}

pub fn triage(dir: Option<PathBuf>, mut settings: Settings, skip_marked: bool) -> Result<()> {
    let root = resolve_root_dir(dir)?;
    settings.skip_marked |= skip_marked;

    let registry = ArchiveRegistry::open(&root)?;
    let cache = open_cache(&settings);
    let mut session = TriageSession::new(registry, settings, cache);

    let stdin = io::stdin();
    let stdout = io::stdout();
    run_triage(&mut session, stdin.lock(), stdout.lock())
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
