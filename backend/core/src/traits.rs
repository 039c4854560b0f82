use std::sync::Arc;

use async_trait::async_trait;

use crate::error::PlatformError;
use crate::message::{Embed, OutgoingMessage};
use crate::types::{ChannelRef, GuildRef, InteractionKind, OptionValue, UserRef, WireCommand};

/// Opaque handle to one inbound interaction on the chat platform.
///
/// Implementations only forward calls; acknowledgement bookkeeping
/// (replied / deferred) lives in the request-scoped command context.
#[async_trait]
pub trait InteractionHandle: Send + Sync {
    fn kind(&self) -> InteractionKind;

    /// Invoked command name as sent by the platform.
    fn command_name(&self) -> &str;

    fn user(&self) -> &UserRef;

    /// `None` for direct messages.
    fn guild(&self) -> Option<&GuildRef>;

    fn channel(&self) -> &ChannelRef;

    fn option(&self, name: &str) -> Option<&OptionValue>;

    /// Initial response.
    async fn respond(&self, message: &OutgoingMessage) -> Result<(), PlatformError>;

    /// Acknowledge now and respond later.
    async fn defer(&self, ephemeral: bool) -> Result<(), PlatformError>;

    /// Edit the original (or deferred) response.
    async fn edit_response(&self, message: &OutgoingMessage) -> Result<(), PlatformError>;

    async fn follow_up(&self, message: &OutgoingMessage) -> Result<(), PlatformError>;

    /// Update the message a component is attached to.
    async fn update_message(&self, message: &OutgoingMessage) -> Result<(), PlatformError>;
}

/// Bulk "replace all application commands" endpoint.
#[async_trait]
pub trait CommandPublisher: Send + Sync {
    /// Whether the platform client can accept a publish right now
    /// (logged in, application id known).
    fn is_ready(&self) -> bool {
        true
    }

    async fn set_commands(&self, commands: &[WireCommand]) -> Result<(), PlatformError>;
}

/// Receives gateway lifecycle and interaction events from a platform adapter.
#[async_trait]
pub trait InteractionSink: Send + Sync {
    /// The adapter is logged in and the publisher is usable.
    async fn on_ready(&self);

    async fn on_interaction(&self, interaction: Arc<dyn InteractionHandle>);
}

/// Records command executions somewhere visible to server admins.
#[async_trait]
pub trait CommandAuditSink: Send + Sync {
    async fn record_command(
        &self,
        guild: Option<&GuildRef>,
        command: &str,
        user: &UserRef,
        success: bool,
    );
}

/// Guild channel operations needed to maintain a log channel.
#[async_trait]
pub trait LogChannelDirectory: Send + Sync {
    /// Id of a text channel with this name, if any.
    async fn find_text_channel(&self, guild_id: u64, name: &str) -> Result<Option<u64>, PlatformError>;

    async fn can_manage_channels(&self, guild_id: u64) -> bool;

    async fn create_text_channel(
        &self,
        guild_id: u64,
        name: &str,
        topic: &str,
    ) -> Result<u64, PlatformError>;

    async fn send_embed(&self, channel_id: u64, embed: &Embed) -> Result<(), PlatformError>;
}
