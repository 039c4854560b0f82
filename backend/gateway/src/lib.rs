//! Slashforge gateway: remote command publishing, publish scheduling and
//! hot reload of command modules, tied together by the bot runtime.

pub mod hot_reload;
pub mod publisher;
pub mod runtime;
pub mod schedule;

pub use hot_reload::{HotReloadConfig, HotReloader, ReloadEvent};
pub use publisher::{PublishOutcome, PublishPolicy, RemoteCommandPublisher};
pub use runtime::{BotRuntime, RuntimeOptions};
pub use schedule::{PublishScheduler, ScheduleConfig};
