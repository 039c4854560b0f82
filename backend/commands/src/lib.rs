//! Slash command registry, module loading and interaction dispatch.

pub mod context;
pub mod dispatch;
pub mod handlers;
pub mod loader;
pub mod module;
pub mod registry;
pub mod types;

#[cfg(test)]
mod testing;

pub use context::{CommandContext, ERROR_NOTICE};
pub use dispatch::{ActivityGuard, ActivityTracker, CommandHandler, DispatchOutcome, InteractionDispatcher};
pub use handlers::{EchoHandler, HandlerTable, HelpHandler, PingHandler, ReplyHandler};
pub use loader::{
    command_stem, discover_module_files, is_supported_module, LoadReport, ModuleLoader,
    SUPPORTED_EXTENSIONS,
};
pub use module::{parse_module, CommandModule, ModuleFormat};
pub use registry::{validate, CommandRegistry, SharedRegistry};
pub use types::{CommandDef, CommandSummary};
