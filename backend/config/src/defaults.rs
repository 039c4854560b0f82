//! Config defaults: fills every optional setting after loading.

use crate::schema::{
    BotConfig, HotReloadSettings, LoggingConfig, PublishSettings,
};

pub const DEFAULT_COMMANDS_DIR: &str = "commands";

pub const DEFAULT_DEBOUNCE_MS: u64 = 300;
pub const DEFAULT_STABILITY_POLL_MS: u64 = 50;
pub const DEFAULT_STABILITY_ATTEMPTS: u32 = 5;
pub const DEFAULT_COOLDOWN_MS: u64 = 3000;
pub const DEFAULT_BUSY_RECHECK_MS: u64 = 1000;
pub const DEFAULT_START_DELAY_MS: u64 = 1000;

pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_LOG_CHANNEL: &str = "bot-logs";

/// Apply all defaults to a freshly loaded config.
pub fn apply_all_defaults(config: BotConfig) -> BotConfig {
    let config = apply_path_defaults(config);
    let config = apply_hot_reload_defaults(config);
    let config = apply_publish_defaults(config);
    apply_logging_defaults(config)
}

fn apply_path_defaults(mut config: BotConfig) -> BotConfig {
    if config.commands_dir.is_none() {
        config.commands_dir = Some(DEFAULT_COMMANDS_DIR.to_string());
    }
    config
}

fn apply_hot_reload_defaults(mut config: BotConfig) -> BotConfig {
    let hot = config.hot_reload.get_or_insert_with(HotReloadSettings::default);
    hot.enabled.get_or_insert(true);
    hot.debounce_ms.get_or_insert(DEFAULT_DEBOUNCE_MS);
    hot.stability_poll_ms.get_or_insert(DEFAULT_STABILITY_POLL_MS);
    hot.stability_attempts.get_or_insert(DEFAULT_STABILITY_ATTEMPTS);
    hot.cooldown_ms.get_or_insert(DEFAULT_COOLDOWN_MS);
    hot.busy_recheck_ms.get_or_insert(DEFAULT_BUSY_RECHECK_MS);
    hot.start_delay_ms.get_or_insert(DEFAULT_START_DELAY_MS);
    config
}

fn apply_publish_defaults(mut config: BotConfig) -> BotConfig {
    let publish = config.publish.get_or_insert_with(PublishSettings::default);
    publish.skip_empty.get_or_insert(true);
    config
}

fn apply_logging_defaults(mut config: BotConfig) -> BotConfig {
    let logging = config.logging.get_or_insert_with(LoggingConfig::default);
    logging.level.get_or_insert_with(|| DEFAULT_LOG_LEVEL.to_string());
    logging.channel_name.get_or_insert_with(|| DEFAULT_LOG_CHANNEL.to_string());
    logging.auto_create_channel.get_or_insert(true);
    config
}
