//! Config file and token file reading.

use crate::schema::BotConfig;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

/// Default config file name within the base directory.
pub const CONFIG_FILE_NAME: &str = "slashforge.yaml";

/// Plain-text token fallback within the base directory.
pub const TOKEN_FILE_NAME: &str = "token.txt";

/// Placeholder shipped in starter token files.
pub const TOKEN_PLACEHOLDER: &str = "YOUR_DISCORD_BOT_TOKEN_HERE";

/// Resolve the full path to the main config file.
pub fn config_file_path(base_dir: &Path) -> PathBuf {
    base_dir.join(CONFIG_FILE_NAME)
}

/// Load and parse the config from disk.
///
/// Returns `Ok(Default::default())` if the file doesn't exist.
pub async fn load_config(path: &Path) -> Result<BotConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "Config file does not exist; using defaults");
        return Ok(BotConfig::default());
    }

    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    if raw.trim().is_empty() {
        return Ok(BotConfig::default());
    }

    let config: BotConfig = serde_yaml::from_str(&raw)
        .with_context(|| format!("Failed to parse config YAML at: {}", path.display()))?;

    info!(path = %path.display(), "Loaded config");
    Ok(config)
}

/// Read `token.txt` from the base directory.
///
/// Missing files, blank files and the starter placeholder all yield `None`.
pub async fn read_token_file(base_dir: &Path) -> Result<Option<String>> {
    let path = base_dir.join(TOKEN_FILE_NAME);
    if !path.exists() {
        return Ok(None);
    }

    let raw = fs::read_to_string(&path)
        .await
        .with_context(|| format!("Failed to read token file: {}", path.display()))?;
    let token = raw.trim();

    if token.is_empty() {
        warn!(path = %path.display(), "Token file is empty");
        return Ok(None);
    }
    if token == TOKEN_PLACEHOLDER {
        warn!(path = %path.display(), "Token file still contains the placeholder token");
        return Ok(None);
    }
    Ok(Some(token.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let cfg = load_config(&config_file_path(dir.path())).await.unwrap();
        assert!(cfg.discord.is_none());
    }

    #[tokio::test]
    async fn invalid_yaml_names_the_file() {
        let dir = TempDir::new().unwrap();
        let path = config_file_path(dir.path());
        std::fs::write(&path, "hotReload: [unclosed").unwrap();
        let err = format!("{:#}", load_config(&path).await.unwrap_err());
        assert!(err.contains(CONFIG_FILE_NAME));
    }

    #[tokio::test]
    async fn token_file_is_trimmed() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(TOKEN_FILE_NAME), "  abc.def \n").unwrap();
        assert_eq!(read_token_file(dir.path()).await.unwrap().as_deref(), Some("abc.def"));
    }

    #[tokio::test]
    async fn placeholder_token_is_rejected() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(TOKEN_FILE_NAME), TOKEN_PLACEHOLDER).unwrap();
        assert_eq!(read_token_file(dir.path()).await.unwrap(), None);
        assert_eq!(read_token_file(&dir.path().join("nope")).await.unwrap(), None);
    }
}
