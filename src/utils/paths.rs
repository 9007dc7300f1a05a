use std::path::{Path, PathBuf};

/// Resolve a configured folder against the mods root; absolute paths are kept as is
pub fn resolve_against(root: &Path, folder: &Path) -> PathBuf {
    if folder.is_absolute() { folder.to_path_buf() } else { root.join(folder) }
}

/// Formats a path with ~ substitution for the home directory
///
/// # Examples
///
/// ```no_run
/// use std::path::PathBuf;
/// use mod_triage::utils::format_path_with_tilde;
///
/// let path = PathBuf::from("/home/alice/.local/share/BeamNG.drive/mods");
/// // "~/.local/share/BeamNG.drive/mods" when the home directory is /home/alice
/// let formatted = format_path_with_tilde(&path);
/// ```
pub fn format_path_with_tilde(path: &Path) -> String {
    format_path_with_tilde_internal(path, dirs::home_dir().as_deref())
}

pub(crate) fn format_path_with_tilde_internal(path: &Path, home: Option<&Path>) -> String {
    if let Some(home) = home {
        if let Ok(rest) = path.strip_prefix(home) {
            if rest.as_os_str().is_empty() {
                return "~".to_string();
            }
            return Path::new("~").join(rest).display().to_string();
        }
    }
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_against_root() {
        let root = Path::new("/games/mods");
        assert_eq!(resolve_against(root, Path::new("cars")), PathBuf::from("/games/mods/cars"));
        assert_eq!(resolve_against(root, Path::new("/archive/maps")), PathBuf::from("/archive/maps"));
    }

    #[test]
    fn test_format_path_with_tilde() {
        let home = Path::new("/home/testuser");
        assert_eq!(
            format_path_with_tilde_internal(Path::new("/home/testuser/mods/cars"), Some(home)),
            "~/mods/cars"
        );
        assert_eq!(format_path_with_tilde_internal(Path::new("/home/testuser"), Some(home)), "~");

        // Component-wise match, not a string prefix
        assert_eq!(
            format_path_with_tilde_internal(Path::new("/home/testuser2/mods"), Some(home)),
            "/home/testuser2/mods"
        );
        assert_eq!(format_path_with_tilde_internal(Path::new("/opt/mods"), None), "/opt/mods");
    }
}
