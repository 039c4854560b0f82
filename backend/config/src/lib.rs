//! `slashforge-config`: bot runtime configuration.
//!
//! Provides:
//! - Typed config schema (`slashforge.yaml`)
//! - `${ENV_VAR}` substitution and well-known env overrides
//! - `token.txt` fallback for the Discord token
//! - Default value application
//! - Validation with field paths
//! - Redacted snapshots for safe display

pub mod defaults;
pub mod env;
pub mod io;
pub mod redact;
pub mod schema;
pub mod validation;

pub use defaults::apply_all_defaults;
pub use env::{
    apply_env_overrides, collect_referenced_vars, parse_flag, process_env, resolve_env_vars,
    resolve_env_vars_with, MissingEnvVarError,
};
pub use io::{config_file_path, load_config, read_token_file, CONFIG_FILE_NAME, TOKEN_FILE_NAME};
pub use redact::{redact, redacted_config};
pub use schema::{BotConfig, DiscordConfig, HotReloadSettings, LoggingConfig, PublishSettings};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

/// Load, substitute env vars, apply overrides and defaults, then validate.
///
/// This is the main entry point for loading a config at runtime.
pub async fn load_and_prepare(base_dir: &Path, path: &Path) -> Result<BotConfig> {
    load_and_prepare_with(base_dir, path, &process_env()).await
}

/// Same as [`load_and_prepare`] against an explicit environment.
pub async fn load_and_prepare_with(
    base_dir: &Path,
    path: &Path,
    env: &HashMap<String, String>,
) -> Result<BotConfig> {
    let raw_config = load_config(path).await?;

    let value: Value = serde_json::to_value(&raw_config)
        .context("Failed to serialize config for processing")?;
    let value = resolve_env_vars_with(&value, env).context("Failed to resolve env vars in config")?;
    let config: BotConfig =
        serde_json::from_value(value).context("Failed to deserialize config after processing")?;

    let mut config = apply_env_overrides(config, env);
    if config.token().is_none() {
        if let Some(token) = read_token_file(base_dir).await? {
            config.discord.get_or_insert_with(DiscordConfig::default).token = Some(token);
        }
    }

    let config = apply_all_defaults(config);

    let report = validate(&config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    for error in &report.errors {
        tracing::error!(path = %error.path, message = %error.message, "Config error");
    }

    Ok(config)
}
