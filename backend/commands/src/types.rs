//! Slash command types.
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use slashforge_core::{OptionSpec, WireCommand, WireOption};

use crate::dispatch::CommandHandler;

// ---------------------------------------------------------------------------
// Command definition
// ---------------------------------------------------------------------------

/// A registered slash command: declared shape plus the handler that runs it.
#[derive(Clone)]
pub struct CommandDef {
    /// Unique key; lowercased by the registry.
    pub name: String,
    pub description: String,
    pub options: Vec<OptionSpec>,
    pub handler: Arc<dyn CommandHandler>,
    /// Module file that declared the command, if any.
    pub source: Option<PathBuf>,
}

impl CommandDef {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        handler: Arc<dyn CommandHandler>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            options: Vec::new(),
            handler,
            source: None,
        }
    }

    pub fn with_options(mut self, options: Vec<OptionSpec>) -> Self {
        self.options = options;
        self
    }

    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn summary(&self) -> CommandSummary {
        CommandSummary {
            name: self.name.clone(),
            description: self.description.clone(),
            options: self.options.clone(),
        }
    }

    pub fn to_wire(&self) -> WireCommand {
        WireCommand {
            name: self.name.clone(),
            description: self.description.clone(),
            options: self.options.iter().map(WireOption::from).collect(),
        }
    }
}

impl fmt::Debug for CommandDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDef")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("options", &self.options)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

/// Read-only view of a command, safe to hand to handlers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandSummary {
    pub name: String,
    pub description: String,
    pub options: Vec<OptionSpec>,
}
