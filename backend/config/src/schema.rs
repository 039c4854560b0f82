//! Slashforge runtime configuration schema.
//!
//! Every field is optional on disk; `defaults::apply_all_defaults` fills the
//! gaps after env substitution so the rest of the bot reads concrete values.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Root configuration, read from `slashforge.yaml` in the base directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotConfig {
    /// Command module directory, relative to the base directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commands_dir: Option<String>,

    /// Discord connection settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discord: Option<DiscordConfig>,

    /// File watcher and republish timing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hot_reload: Option<HotReloadSettings>,

    /// Remote command registration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish: Option<PublishSettings>,

    /// Process logs and the per-guild audit channel
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

impl BotConfig {
    /// Absolute command directory for a given base directory.
    pub fn commands_path(&self, base_dir: &Path) -> PathBuf {
        let dir = self.commands_dir.as_deref().unwrap_or(crate::defaults::DEFAULT_COMMANDS_DIR);
        base_dir.join(dir)
    }

    pub fn token(&self) -> Option<&str> {
        self.discord
            .as_ref()
            .and_then(|d| d.token.as_deref())
            .filter(|t| !t.trim().is_empty())
    }

    pub fn hot_reload_enabled(&self) -> bool {
        self.hot_reload
            .as_ref()
            .and_then(|h| h.enabled)
            .unwrap_or(true)
    }
}

// ---------------------------------------------------------------------------
// Discord
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscordConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

// ---------------------------------------------------------------------------
// Hot reload
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotReloadSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debounce_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stability_poll_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stability_attempts: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooldown_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub busy_recheck_ms: Option<u64>,
    /// Delay between the gateway ready event and starting the watcher.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_delay_ms: Option<u64>,
}

// ---------------------------------------------------------------------------
// Publish
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishSettings {
    /// Skip the remote overwrite while the registry is empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_empty: Option<bool>,
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `slashforge_gateway=debug`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    /// Directory for the rolling JSON log; console only when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_create_channel: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_camel_case_yaml() {
        let yaml = r#"
commandsDir: cmds
discord:
  token: abc
hotReload:
  enabled: false
  debounceMs: 500
publish:
  skipEmpty: false
logging:
  channelName: audit
"#;
        let config: BotConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.commands_path(Path::new("/bot")), PathBuf::from("/bot/cmds"));
        assert_eq!(config.token(), Some("abc"));
        assert!(!config.hot_reload_enabled());
        assert_eq!(config.hot_reload.unwrap().debounce_ms, Some(500));
        assert_eq!(config.publish.unwrap().skip_empty, Some(false));
        assert_eq!(config.logging.unwrap().channel_name.as_deref(), Some("audit"));
    }

    #[test]
    fn blank_token_counts_as_missing() {
        let config = BotConfig {
            discord: Some(DiscordConfig { token: Some("  ".into()) }),
            ..Default::default()
        };
        assert_eq!(config.token(), None);
        assert!(config.hot_reload_enabled());
    }
}
