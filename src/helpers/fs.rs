//! File System Utilities
//!
//! Configuration directory management and path handling.

use crate::error::{Error, Result};
use directories::ProjectDirs;
use home::home_dir;
use std::fs;
use std::path::{Path, PathBuf};

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("io", "status-board", "status-board").ok_or_else(|| Error::Invalid {
        message: "Could not determine project directories".to_string(),
    })
}

/// Get or create the application's configuration directory
///
/// Platform-specific locations:
/// - **Linux**: `~/.config/status-board/` or `$XDG_CONFIG_HOME/status-board/`
/// - **macOS**: `~/Library/Application Support/io.status-board.status-board/`
/// - **Windows**: `C:\Users\<User>\AppData\Roaming\status-board\status-board\config\`
pub fn get_or_create_config_dir() -> Result<PathBuf> {
    let project_dirs = project_dirs()?;
    let config_dir = project_dirs.config_dir();

    if !config_dir.exists() {
        fs::create_dir_all(config_dir)?;
    }

    Ok(config_dir.to_path_buf())
}

/// Expand a leading `~/` to the user's home directory
pub fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

/// Create the parent directory of `path` if it is missing
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_home() {
        let plain = Path::new("/var/www/checks.html");
        assert_eq!(expand_home(plain), plain);

        if let Some(home) = home_dir() {
            assert_eq!(
                expand_home(Path::new("~/checks.html")),
                home.join("checks.html")
            );
        }
    }

    #[test]
    fn test_ensure_parent_dir() {
        let dir = std::env::temp_dir().join(format!("status-board-{}", uuid::Uuid::new_v4()));
        let file = dir.join("nested").join("page.html");

        ensure_parent_dir(&file).expect("create parent");
        assert!(dir.join("nested").is_dir());

        let _ = fs::remove_dir_all(&dir);
    }
}
