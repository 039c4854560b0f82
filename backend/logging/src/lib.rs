//! Structured logging for slashforge.
//!
//! Console + rolling JSON file output, command event records, and token redaction.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{CommandEvent, CommandEventLogger, EventLogEntry};
pub use logger::{init_logger, LoggerGuard};
pub use redact::redact_sensitive_data;
