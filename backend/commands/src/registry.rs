//! Slash command registry: in-memory table keyed by lowercased name.
use std::collections::HashMap;
use std::sync::Arc;

use slashforge_core::{DefinitionError, WireCommand, MAX_DESCRIPTION_LEN, MAX_NAME_LEN};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::dispatch::CommandHandler;
use crate::types::{CommandDef, CommandSummary};

/// Registry shared between the loader, the hot reloader, and the dispatcher.
pub type SharedRegistry = Arc<RwLock<CommandRegistry>>;

/// Check a definition against the registration constraints.
pub fn validate(def: &CommandDef) -> Result<(), DefinitionError> {
    let name = def.name.trim();
    if name.is_empty() {
        return Err(DefinitionError::EmptyName);
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(DefinitionError::NameTooLong(name.to_string()));
    }
    if def.description.trim().is_empty() {
        return Err(DefinitionError::EmptyDescription(name.to_string()));
    }
    if def.description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(DefinitionError::DescriptionTooLong(name.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct CommandRegistry {
    commands: HashMap<String, CommandDef>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedRegistry {
        Arc::new(RwLock::new(Self::new()))
    }

    /// Insert or overwrite a command. Returns the stored (lowercased) name.
    ///
    /// Invalid definitions are logged and leave the registry untouched.
    pub fn register(&mut self, mut def: CommandDef) -> Result<String, DefinitionError> {
        if let Err(e) = validate(&def) {
            warn!(error = %e, "[Registry] Rejected command definition");
            return Err(e);
        }
        let name = def.name.trim().to_lowercase();
        def.name = name.clone();
        if self.commands.insert(name.clone(), def).is_some() {
            debug!(command = %name, "[Registry] Overwrote command");
        } else {
            debug!(command = %name, "[Registry] Registered command");
        }
        Ok(name)
    }

    /// Remove a command by name. Returns whether anything was removed.
    pub fn remove(&mut self, name: &str) -> bool {
        self.commands.remove(&name.trim().to_lowercase()).is_some()
    }

    pub fn has(&self, name: &str) -> bool {
        self.commands.contains_key(&name.trim().to_lowercase())
    }

    pub fn get(&self, name: &str) -> Option<&CommandDef> {
        self.commands.get(&name.trim().to_lowercase())
    }

    pub fn handler(&self, name: &str) -> Option<Arc<dyn CommandHandler>> {
        self.get(name).map(|def| Arc::clone(&def.handler))
    }

    /// All commands, in internal map order.
    pub fn list(&self) -> Vec<CommandSummary> {
        self.commands.values().map(CommandDef::summary).collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.commands.keys().cloned().collect()
    }

    /// Publishable payload, sorted by name so repeated publishes are identical.
    pub fn wire_commands(&self) -> Vec<WireCommand> {
        let mut wire: Vec<WireCommand> = self.commands.values().map(CommandDef::to_wire).collect();
        wire.sort_by(|a, b| a.name.cmp(&b.name));
        wire
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
