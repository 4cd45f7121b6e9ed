//! ConfigStore - Local Configuration Storage
//!
//! The configuration lives in `config.toml`. The server password is stored
//! encrypted and decrypted on load.

use std::path::{Path, PathBuf};

use smol::fs;
use tracing::info;

use crate::domain::AppConfig;
use crate::error::Result;
use crate::helpers::{decrypt, encrypt, ensure_parent_dir, get_or_create_config_dir};

const CONFIG_FILE: &str = "config.toml";

/// Default configuration file path
pub fn default_config_path() -> Result<PathBuf> {
    Ok(get_or_create_config_dir()?.join(CONFIG_FILE))
}

/// Load the configuration, falling back to defaults when the file is missing
pub fn load_config(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }

    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(AppConfig::default());
    }

    let mut config: AppConfig = toml::from_str(&content)?;

    // Plain-text passwords written by hand are accepted as-is
    if let Some(pwd) = &config.server.password {
        config.server.password = Some(decrypt(pwd).unwrap_or_else(|_| pwd.clone()));
    }

    Ok(config)
}

/// Save the configuration, encrypting the password
pub async fn save_config(path: &Path, config: &AppConfig) -> Result<()> {
    let mut stored = config.clone();
    if let Some(pwd) = &config.server.password {
        if !pwd.is_empty() {
            stored.server.password = Some(encrypt(pwd)?);
        }
    }

    ensure_parent_dir(path)?;
    let content = toml::to_string_pretty(&stored)?;
    fs::write(path, content).await?;
    Ok(())
}

/// Load the configuration, writing a default file on first run
pub async fn load_or_init_config(path: &Path) -> Result<AppConfig> {
    if path.exists() {
        return load_config(path);
    }

    let config = AppConfig::default();
    save_config(path, &config).await?;
    info!("Wrote default configuration to {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("status-board-{}", uuid::Uuid::new_v4()))
            .join(CONFIG_FILE)
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = load_config(&temp_path()).expect("load");
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_save_encrypts_password() {
        let path = temp_path();
        let mut config = AppConfig::default();
        config.server.password = Some("hunter2".to_string());
        config.render.title = "Night shift".to_string();

        smol::block_on(save_config(&path, &config)).expect("save");

        let raw = std::fs::read_to_string(&path).expect("read");
        assert!(!raw.contains("hunter2"));

        let loaded = load_config(&path).expect("load");
        assert_eq!(loaded, config);

        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn test_plain_password_is_accepted() {
        let path = temp_path();
        ensure_parent_dir(&path).expect("dir");
        std::fs::write(&path, "[server]\npassword = \"plain\"\n").expect("write");

        let loaded = load_config(&path).expect("load");
        assert_eq!(loaded.server.password.as_deref(), Some("plain"));

        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn test_load_or_init_writes_defaults() {
        let path = temp_path();
        let config = smol::block_on(load_or_init_config(&path)).expect("init");

        assert_eq!(config, AppConfig::default());
        assert!(path.exists());

        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }
}
