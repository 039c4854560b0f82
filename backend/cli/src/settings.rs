//! Resolved bot settings: the prepared config file plus the base directory,
//! mapped onto the runtime and audit log option types.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use slashforge_channels::AuditLogConfig;
use slashforge_config::{
    config_file_path, load_and_prepare, validate, BotConfig, HotReloadSettings,
};
use slashforge_gateway::{HotReloadConfig, PublishPolicy, RuntimeOptions, ScheduleConfig};
use tracing::{error, warn};

pub struct Settings {
    pub base_dir: PathBuf,
    pub config: BotConfig,
}

impl Settings {
    pub async fn load(base_dir: &Path, config_path: Option<&Path>) -> Result<Self> {
        let path = match config_path {
            Some(path) => path.to_path_buf(),
            None => config_file_path(base_dir),
        };
        let config = load_and_prepare(base_dir, &path).await?;
        Ok(Self { base_dir: base_dir.to_path_buf(), config })
    }

    pub fn commands_path(&self) -> PathBuf {
        self.config.commands_path(&self.base_dir)
    }

    pub fn log_level(&self) -> &str {
        self.config
            .logging
            .as_ref()
            .and_then(|l| l.level.as_deref())
            .unwrap_or(slashforge_config::defaults::DEFAULT_LOG_LEVEL)
    }

    pub fn log_dir(&self) -> Option<PathBuf> {
        let dir = self.config.logging.as_ref()?.dir.as_deref()?;
        Some(self.base_dir.join(dir))
    }

    /// A `--hot-reload`/`--no-hot-reload` flag wins over env and file.
    pub fn hot_reload(&self, flag: Option<bool>) -> bool {
        flag.unwrap_or_else(|| self.config.hot_reload_enabled())
    }

    pub fn runtime_options(&self, hot_reload_flag: Option<bool>) -> RuntimeOptions {
        let defaults = RuntimeOptions::default();
        let hot = self.config.hot_reload.clone().unwrap_or_else(HotReloadSettings::default);
        let ms = |value: Option<u64>, fallback: Duration| value.map(Duration::from_millis).unwrap_or(fallback);

        RuntimeOptions {
            hot_reload: self.hot_reload(hot_reload_flag),
            hot_reload_start_delay: ms(hot.start_delay_ms, defaults.hot_reload_start_delay),
            reload: HotReloadConfig {
                debounce: ms(hot.debounce_ms, defaults.reload.debounce),
                stability_poll: ms(hot.stability_poll_ms, defaults.reload.stability_poll),
                stability_attempts: hot.stability_attempts.unwrap_or(defaults.reload.stability_attempts),
            },
            schedule: ScheduleConfig {
                cooldown: ms(hot.cooldown_ms, defaults.schedule.cooldown),
                busy_recheck: ms(hot.busy_recheck_ms, defaults.schedule.busy_recheck),
            },
            policy: PublishPolicy {
                skip_empty: self
                    .config
                    .publish
                    .as_ref()
                    .and_then(|p| p.skip_empty)
                    .unwrap_or(defaults.policy.skip_empty),
            },
        }
    }

    pub fn audit_config(&self) -> AuditLogConfig {
        let defaults = AuditLogConfig::default();
        let logging = self.config.logging.as_ref();
        AuditLogConfig {
            channel_name: logging
                .and_then(|l| l.channel_name.clone())
                .unwrap_or(defaults.channel_name),
            auto_create_channel: logging
                .and_then(|l| l.auto_create_channel)
                .unwrap_or(defaults.auto_create_channel),
        }
    }

    /// Re-emit validation findings once the subscriber is installed.
    pub fn log_report(&self) -> bool {
        let report = validate(&self.config);
        for warning in &report.warnings {
            warn!(path = %warning.path, "{}", warning.message);
        }
        for err in &report.errors {
            error!(path = %err.path, "{}", err.message);
        }
        report.is_valid()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slashforge_config::{apply_all_defaults, LoggingConfig, PublishSettings};

    fn settings(config: BotConfig) -> Settings {
        Settings { base_dir: PathBuf::from("/srv/bot"), config: apply_all_defaults(config) }
    }

    #[test]
    fn maps_timings_onto_runtime_options() {
        let s = settings(BotConfig {
            hot_reload: Some(HotReloadSettings {
                debounce_ms: Some(100),
                cooldown_ms: Some(5000),
                ..Default::default()
            }),
            publish: Some(PublishSettings { skip_empty: Some(false) }),
            ..Default::default()
        });
        let options = s.runtime_options(None);

        assert!(options.hot_reload);
        assert_eq!(options.reload.debounce, Duration::from_millis(100));
        assert_eq!(options.reload.stability_attempts, 5);
        assert_eq!(options.schedule.cooldown, Duration::from_millis(5000));
        assert_eq!(options.schedule.busy_recheck, Duration::from_millis(1000));
        assert!(!options.policy.skip_empty);
    }

    #[test]
    fn cli_flag_beats_config() {
        let s = settings(BotConfig {
            hot_reload: Some(HotReloadSettings { enabled: Some(false), ..Default::default() }),
            ..Default::default()
        });
        assert!(!s.runtime_options(None).hot_reload);
        assert!(s.runtime_options(Some(true)).hot_reload);
    }

    #[test]
    fn paths_resolve_against_base_dir() {
        let s = settings(BotConfig {
            logging: Some(LoggingConfig { dir: Some("logs".into()), ..Default::default() }),
            ..Default::default()
        });
        assert_eq!(s.commands_path(), PathBuf::from("/srv/bot/commands"));
        assert_eq!(s.log_dir(), Some(PathBuf::from("/srv/bot/logs")));
        assert_eq!(s.audit_config().channel_name, "bot-logs");
        assert_eq!(s.log_level(), "info");
    }
}
