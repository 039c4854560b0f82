//! Config validation with field paths and user-friendly messages.

use crate::schema::BotConfig;
use thiserror::Error;

/// Discord's limit on channel name length.
const MAX_CHANNEL_NAME: usize = 100;

const KNOWN_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// A collection of validation errors found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError { path: path.into(), message: message.into() });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError { path: path.into(), message: message.into() });
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &BotConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_paths(config, &mut report);
    validate_discord(config, &mut report);
    validate_hot_reload(config, &mut report);
    validate_logging(config, &mut report);
    report
}

fn validate_paths(config: &BotConfig, report: &mut ValidationReport) {
    if let Some(dir) = &config.commands_dir {
        if dir.trim().is_empty() {
            report.error("commandsDir", "commandsDir cannot be empty");
        }
    }
}

/// A missing token only blocks `run`, so it is a warning here.
fn validate_discord(config: &BotConfig, report: &mut ValidationReport) {
    if config.token().is_none() {
        report.warn(
            "discord.token",
            "No Discord token configured; set DISCORD_TOKEN, BOT_TOKEN or token.txt",
        );
    }
}

fn validate_hot_reload(config: &BotConfig, report: &mut ValidationReport) {
    let Some(hot) = &config.hot_reload else { return };
    if hot.busy_recheck_ms == Some(0) {
        report.error("hotReload.busyRecheckMs", "busyRecheckMs must be > 0");
    }
    if hot.stability_attempts == Some(0) {
        report.error("hotReload.stabilityAttempts", "stabilityAttempts must be >= 1");
    }
    if hot.stability_poll_ms == Some(0) {
        report.warn(
            "hotReload.stabilityPollMs",
            "stabilityPollMs is 0; partially written files may be loaded",
        );
    }
    if hot.debounce_ms == Some(0) {
        report.warn(
            "hotReload.debounceMs",
            "debounceMs is 0; every filesystem event reloads the module",
        );
    }
}

fn validate_logging(config: &BotConfig, report: &mut ValidationReport) {
    let Some(logging) = &config.logging else { return };

    if let Some(level) = &logging.level {
        let simple = level.trim().to_ascii_lowercase();
        if !level.contains('=') && !KNOWN_LEVELS.contains(&simple.as_str()) {
            report.warn("logging.level", format!("Unknown log level '{level}'"));
        }
    }

    if let Some(name) = &logging.channel_name {
        if name.trim().is_empty() {
            report.error("logging.channelName", "channelName cannot be empty");
        } else if name.chars().count() > MAX_CHANNEL_NAME {
            report.error(
                "logging.channelName",
                format!("channelName must be at most {MAX_CHANNEL_NAME} characters"),
            );
        } else if name.chars().any(|c| c.is_whitespace() || c.is_uppercase()) {
            report.warn(
                "logging.channelName",
                "Discord lowercases text channel names and replaces spaces; lookups may miss the channel",
            );
        }
    }
}
