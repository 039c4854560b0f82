//! Command Event Logger
//!
//! Structured records (invoked, completed, failed) for every dispatched command,
//! emitted under the `command_events` target.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::redact::redact_sensitive_data;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommandEvent {
    Invoked { user: String },
    Completed { elapsed_ms: u64 },
    Failed { error_msg: String, elapsed_ms: u64 },
}

#[derive(Debug, Serialize)]
pub struct EventLogEntry {
    pub command: String,
    pub timestamp: DateTime<Utc>,
    pub event: CommandEvent,
}

pub struct CommandEventLogger;

impl CommandEventLogger {
    /// Build the entry for an event, redacting any error text.
    pub fn entry(command: &str, mut event: CommandEvent) -> EventLogEntry {
        if let CommandEvent::Failed { error_msg, .. } = &mut event {
            *error_msg = redact_sensitive_data(error_msg);
        }
        EventLogEntry { command: command.to_string(), timestamp: Utc::now(), event }
    }

    pub fn log_event(command: &str, event: CommandEvent) {
        let entry = Self::entry(command, event);
        let record = serde_json::to_string(&entry).unwrap_or_default();
        match entry.event {
            CommandEvent::Failed { .. } => {
                warn!(target: "command_events", command = %entry.command, %record, "Command event")
            }
            _ => info!(target: "command_events", command = %entry.command, %record, "Command event"),
        }
    }
}
