//! Declarative command module files.
//!
//! A module file (TOML, YAML or JSON) declares either one command at the top
//! level, a `commands` list, or both:
//!
//! ```toml
//! name = "hello"
//! description = "Say hello"
//! reply = "Hello {user}!"
//!
//! [[commands]]
//! name = "ping"
//! description = "Check latency"
//! handler = "ping"
//! ```

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use slashforge_core::{DefinitionError, ModuleError, OptionSpec, OutgoingMessage};

use crate::dispatch::CommandHandler;
use crate::handlers::{HandlerTable, ReplyHandler};
use crate::types::CommandDef;

/// Description used when a top-level command omits one.
pub const DEFAULT_DESCRIPTION: &str = "No description";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleFormat {
    Toml,
    Yaml,
    Json,
}

impl ModuleFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "toml" => Some(Self::Toml),
            "yaml" | "yml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// `reply = "text"` or a full message table.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ReplySpec {
    Text(String),
    Message(OutgoingMessage),
}

impl From<ReplySpec> for OutgoingMessage {
    fn from(spec: ReplySpec) -> Self {
        match spec {
            ReplySpec::Text(text) => OutgoingMessage::text(text),
            ReplySpec::Message(message) => message,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommandEntry {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub options: Vec<OptionSpec>,
    /// Id from the handler table; takes precedence over `reply`.
    pub handler: Option<String>,
    pub reply: Option<ReplySpec>,
}

impl CommandEntry {
    fn is_blank(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.options.is_empty()
            && self.handler.is_none()
            && self.reply.is_none()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommandModule {
    #[serde(flatten)]
    pub main: CommandEntry,
    #[serde(default)]
    pub commands: Vec<CommandEntry>,
}

/// Parse module source according to the file's extension.
pub fn parse_module(path: &Path, source: &str) -> Result<CommandModule, ModuleError> {
    let format =
        ModuleFormat::from_path(path).ok_or_else(|| ModuleError::Unsupported(path.to_path_buf()))?;
    let parse_err = |message: String| ModuleError::Parse { path: path.to_path_buf(), message };

    if source.trim().is_empty() {
        return Ok(CommandModule::default());
    }
    match format {
        ModuleFormat::Toml => toml::from_str(source).map_err(|e| parse_err(e.to_string())),
        ModuleFormat::Yaml => serde_yaml::from_str(source).map_err(|e| parse_err(e.to_string())),
        ModuleFormat::Json => serde_json::from_str(source).map_err(|e| parse_err(e.to_string())),
    }
}

impl CommandModule {
    /// Build command definitions. Entries that cannot be built are reported
    /// individually and do not affect their siblings.
    pub fn into_definitions(
        self,
        handlers: &HandlerTable,
        source: &Path,
    ) -> (Vec<CommandDef>, Vec<DefinitionError>) {
        let mut defs = Vec::new();
        let mut errors = Vec::new();

        if !self.main.is_blank() {
            let mut main = self.main;
            if main.description.is_none() {
                main.description = Some(DEFAULT_DESCRIPTION.to_string());
            }
            match build(main, handlers, source) {
                Ok(def) => defs.push(def),
                Err(e) => errors.push(e),
            }
        }
        for entry in self.commands {
            match build(entry, handlers, source) {
                Ok(def) => defs.push(def),
                Err(e) => errors.push(e),
            }
        }
        (defs, errors)
    }
}

fn build(
    entry: CommandEntry,
    handlers: &HandlerTable,
    source: &Path,
) -> Result<CommandDef, DefinitionError> {
    let name = entry.name.map(|n| n.trim().to_string()).unwrap_or_default();
    if name.is_empty() {
        return Err(DefinitionError::EmptyName);
    }
    let description = entry.description.unwrap_or_default();
    if description.trim().is_empty() {
        return Err(DefinitionError::EmptyDescription(name));
    }

    let handler: Arc<dyn CommandHandler> = match (entry.handler, entry.reply) {
        (Some(id), _) => handlers
            .get(&id)
            .ok_or_else(|| DefinitionError::UnknownHandler { command: name.clone(), handler: id })?,
        (None, Some(reply)) => Arc::new(ReplyHandler::new(reply.into())),
        (None, None) => return Err(DefinitionError::MissingAction(name)),
    };

    Ok(CommandDef::new(name, description, handler)
        .with_options(entry.options)
        .with_source(source))
}
