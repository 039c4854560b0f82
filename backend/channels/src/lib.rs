use std::sync::Arc;

use async_trait::async_trait;
use slashforge_core::InteractionSink;

pub mod audit_log;
pub mod discord;
pub mod discord_embeds;
pub mod discord_slash;

pub use audit_log::{AuditLogConfig, DEFAULT_LOG_CHANNEL, GuildAuditLogger};
pub use discord::{DiscordAdapter, DiscordHandles, SerenityInteraction, SerenityLogDirectory};
pub use discord_slash::SerenityPublisher;

/// All platform adapters implement this trait.
#[async_trait]
pub trait ChannelAdapter: Send + Sync {
    /// Human-readable adapter name for logging.
    fn name(&self) -> &str;

    /// Connect and deliver events to `sink` until the connection closes.
    async fn start(&self, sink: Arc<dyn InteractionSink>) -> anyhow::Result<()>;
}
