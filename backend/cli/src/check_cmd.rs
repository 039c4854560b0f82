//! `slashforge check`: load every command module offline and report what
//! would be registered.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;
use slashforge_commands::{CommandRegistry, HandlerTable, LoadReport, ModuleLoader};
use slashforge_config::{redacted_config, validate};
use slashforge_core::WireCommand;
use slashforge_logging::init_logger;

use crate::settings::Settings;
use crate::terminal_output::{command_table, note, use_color, Note};

/// One registered command as shown in the table.
#[derive(Debug, Serialize)]
pub struct CheckRow {
    pub name: String,
    pub description: String,
    pub options: usize,
    pub source: Option<String>,
}

#[derive(Debug, Serialize)]
struct FailureJson<'a> {
    file: &'a str,
    error: &'a str,
}

pub struct Inspection {
    pub report: LoadReport,
    pub rows: Vec<CheckRow>,
    pub wire: Vec<WireCommand>,
}

/// Load `commands_dir` into a fresh registry and collect the results.
pub async fn inspect(commands_dir: &Path) -> Inspection {
    let loader = Arc::new(ModuleLoader::new(
        commands_dir,
        CommandRegistry::shared(),
        HandlerTable::with_builtins(),
    ));
    let report = loader.load_all().await;

    let registry = loader.registry().read().await;
    let rows = registry
        .names()
        .iter()
        .filter_map(|name| registry.get(name))
        .map(|def| CheckRow {
            name: def.name.clone(),
            description: def.description.clone(),
            options: def.options.len(),
            source: def.source.as_deref().map(|p| loader.relative(p)),
        })
        .collect();
    let wire = registry.wire_commands();
    drop(registry);

    Inspection { report, rows, wire }
}

pub async fn run(base_dir: PathBuf, config: Option<PathBuf>, json: bool) -> Result<bool> {
    // JSON goes to stdout, so the console logger stays off in that mode.
    let _guard = (!json).then(|| init_logger(None, "warn"));

    let settings = Settings::load(&base_dir, config.as_deref()).await?;
    let config_report = validate(&settings.config);
    let inspection = inspect(&settings.commands_path()).await;
    let ok = inspection.report.is_clean() && config_report.is_valid();

    if json {
        let failures: Vec<_> = inspection
            .report
            .failures
            .iter()
            .map(|(file, error)| FailureJson { file, error })
            .collect();
        let issues = |list: &[slashforge_config::ConfigValidationError]| {
            list.iter()
                .map(|e| serde_json::json!({ "path": e.path, "message": e.message }))
                .collect::<Vec<_>>()
        };
        let body = serde_json::json!({
            "ok": ok,
            "commandsDir": settings.commands_path(),
            "commands": inspection.wire,
            "failures": failures,
            "config": redacted_config(&settings.config),
            "configErrors": issues(&config_report.errors),
            "configWarnings": issues(&config_report.warnings),
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(ok);
    }

    note(Note::Info, &format!(
        "Loaded {} module file(s) from {}",
        inspection.report.files,
        settings.commands_path().display()
    ));
    println!();
    print!("{}", command_table(&inspection.rows, use_color()));
    println!();

    for warning in &config_report.warnings {
        note(Note::Warn, &format!("{}: {}", warning.path, warning.message));
    }
    for err in &config_report.errors {
        note(Note::Error, &format!("{}: {}", err.path, err.message));
    }
    for (file, error) in &inspection.report.failures {
        note(Note::Error, &format!("{file}: {error}"));
    }

    if ok {
        note(Note::Success, &format!("{} command(s) ready to publish", inspection.rows.len()));
    } else {
        note(Note::Error, "Some checks failed; fix the errors above before running the bot");
    }
    Ok(ok)
}
