use std::path::PathBuf;

use thiserror::Error;

/// Maximum command name length accepted by the platform.
pub const MAX_NAME_LEN: usize = 32;

/// Maximum command description length accepted by the platform.
pub const MAX_DESCRIPTION_LEN: usize = 100;

/// A command definition that cannot be registered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    #[error("command name must be a non-empty string")]
    EmptyName,

    #[error("command '{0}' must have a non-empty description")]
    EmptyDescription(String),

    #[error("command name '{0}' is longer than {MAX_NAME_LEN} characters")]
    NameTooLong(String),

    #[error("description of '{0}' is longer than {MAX_DESCRIPTION_LEN} characters")]
    DescriptionTooLong(String),

    #[error("command '{0}' has no handler or reply")]
    MissingAction(String),

    #[error("command '{command}' references unknown handler '{handler}'")]
    UnknownHandler { command: String, handler: String },
}

/// Failure to read or parse a command module file.
#[derive(Debug, Error)]
pub enum ModuleError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("unsupported module file: {0}")]
    Unsupported(PathBuf),
}

/// Errors reported by the chat platform boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    /// The acknowledgement window elapsed; nothing more can be sent.
    #[error("interaction expired before it was acknowledged")]
    InteractionExpired,

    #[error("interaction was already acknowledged")]
    AlreadyAcknowledged,

    #[error("interaction has not been acknowledged yet")]
    NotAcknowledged,

    #[error("platform client is not ready")]
    NotReady,

    #[error("missing permission: {0}")]
    MissingPermission(String),

    #[error("platform request failed: {0}")]
    Request(String),
}

impl PlatformError {
    pub fn is_expired(&self) -> bool {
        matches!(self, PlatformError::InteractionExpired)
    }
}
