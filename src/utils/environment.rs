use std::env;
use std::path::PathBuf;

use anyhow::{Result, bail};
use tracing::debug;

/// Overrides the mods directory when no directory is given on the command line
pub const ROOT_ENV_VAR: &str = "MOD_TRIAGE_ROOT";
/// Overrides the configuration file location
pub const CONFIG_ENV_VAR: &str = "MOD_TRIAGE_CONFIG";

const APP_DIR: &str = "mod-triage";
const GAME_DIR: &str = "BeamNG.drive";

/// Well-known places the game keeps its user mods, most specific first
pub fn default_mod_dirs() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(local) = dirs::data_local_dir() {
        candidates.push(local.join(GAME_DIR).join("mods"));
    }
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(".local").join("share").join(GAME_DIR).join("mods"));
    }
    if let Some(docs) = dirs::document_dir() {
        candidates.push(docs.join(GAME_DIR).join("mods"));
    }
    candidates.dedup();
    candidates
}

/// Pick the mods directory: explicit argument, then `MOD_TRIAGE_ROOT`, then the first
/// well-known game folder that exists
pub fn resolve_root_dir(explicit: Option<PathBuf>) -> Result<PathBuf> {
    resolve_root_dir_from(explicit, env::var_os(ROOT_ENV_VAR).map(PathBuf::from), &default_mod_dirs())
}

pub(crate) fn resolve_root_dir_from(
    explicit: Option<PathBuf>,
    from_env: Option<PathBuf>,
    candidates: &[PathBuf],
) -> Result<PathBuf> {
    if let Some(dir) = explicit {
        return Ok(dir);
    }
    if let Some(dir) = from_env.filter(|d| !d.as_os_str().is_empty()) {
        debug!("Using mods directory from {}: {}", ROOT_ENV_VAR, dir.display());
        return Ok(dir);
    }
    if let Some(dir) = candidates.iter().find(|d| d.is_dir()) {
        debug!("Auto-detected mods directory {}", dir.display());
        return Ok(dir.clone());
    }
    bail!("No mods directory given and none found; pass a directory or set {}", ROOT_ENV_VAR)
}

/// Configuration file location: `MOD_TRIAGE_CONFIG`, else `<config dir>/mod-triage/config.json`
pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = env::var_os(CONFIG_ENV_VAR).filter(|p| !p.is_empty()) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.json"))
}

/// Directory for log files: `<local data dir>/mod-triage/logs`
pub fn log_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|dir| dir.join(APP_DIR).join("logs"))
}
