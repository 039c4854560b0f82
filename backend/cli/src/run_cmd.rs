//! `slashforge run`: connect to Discord and serve slash commands until Ctrl+C.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use slashforge_channels::{ChannelAdapter, DiscordAdapter, GuildAuditLogger};
use slashforge_commands::{CommandRegistry, HandlerTable, ModuleLoader};
use slashforge_config::redacted_config;
use slashforge_core::{CommandAuditSink, InteractionSink};
use slashforge_gateway::{BotRuntime, ReloadEvent};
use slashforge_logging::init_logger;
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};

use crate::settings::Settings;
use crate::terminal_output::{note, Note};

pub async fn run(base_dir: PathBuf, config: Option<PathBuf>, hot_reload: Option<bool>) -> Result<()> {
    let settings = Settings::load(&base_dir, config.as_deref()).await?;
    let _guard = init_logger(settings.log_dir().as_deref(), settings.log_level());
    install_panic_hook();

    if !settings.log_report() {
        return Err(anyhow!("Invalid configuration; run `slashforge check` for details"));
    }
    let token = settings
        .config
        .token()
        .map(str::to_string)
        .ok_or_else(|| anyhow!("No Discord token found. Set DISCORD_TOKEN or BOT_TOKEN, or put it in token.txt"))?;

    info!(config = %redacted_config(&settings.config), "Starting slashforge");

    let loader = Arc::new(ModuleLoader::new(
        settings.commands_path(),
        CommandRegistry::shared(),
        HandlerTable::with_builtins(),
    ));
    let adapter = DiscordAdapter::new(token);
    let audit: Arc<dyn CommandAuditSink> =
        Arc::new(GuildAuditLogger::new(adapter.log_directory(), settings.audit_config()));
    let runtime = Arc::new(BotRuntime::new(
        loader,
        adapter.publisher(),
        Some(audit),
        settings.runtime_options(hot_reload),
    ));

    let report = runtime.load_commands().await;
    if !report.is_clean() {
        warn!(failed = report.failures.len(), "Some command modules failed to load");
    }

    tokio::spawn(print_reload_events(runtime.clone()));

    let sink: Arc<dyn InteractionSink> = runtime.clone();
    info!(adapter = adapter.name(), "Connecting");
    let outcome = tokio::select! {
        result = adapter.start(sink) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
            Ok(())
        }
    };

    adapter.shutdown().await;
    runtime.shutdown().await;
    outcome
}

/// Mirror hot reload results on the terminal.
async fn print_reload_events(runtime: Arc<BotRuntime>) {
    let mut events = runtime.reloader().subscribe();
    drop(runtime);
    loop {
        match events.recv().await {
            Ok(ReloadEvent::Reloaded { path, commands }) => {
                note(Note::Success, &format!("Reloaded {} ({})", path.display(), slash_list(&commands)));
            }
            Ok(ReloadEvent::Unloaded { path, commands }) => {
                note(Note::Warn, &format!("Unloaded {} ({})", path.display(), slash_list(&commands)));
            }
            Ok(ReloadEvent::Failed { path, error }) => {
                note(Note::Error, &format!("Reload of {} failed: {error}", path.display()));
            }
            Err(RecvError::Lagged(skipped)) => warn!(skipped, "Dropped reload notices"),
            Err(RecvError::Closed) => break,
        }
    }
}

fn slash_list(commands: &[String]) -> String {
    if commands.is_empty() {
        return "no commands".to_string();
    }
    commands.iter().map(|c| format!("/{c}")).collect::<Vec<_>>().join(", ")
}

/// Log panics through tracing instead of letting them hit stderr unformatted.
/// Handler panics are already contained by the dispatcher; the process keeps running.
fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        error!(panic = %info, "Unhandled panic");
    }));
}
