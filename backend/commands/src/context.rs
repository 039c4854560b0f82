//! Request-scoped command context.
//!
//! Wraps one platform interaction and tracks whether it has been replied to
//! or deferred, so handlers can call `reply` without caring which of the
//! platform's response endpoints is currently valid.
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use slashforge_core::{
    ChannelRef, GuildRef, InteractionHandle, OptionValue, OutgoingMessage, PlatformError, UserRef,
};
use tracing::{debug, error, warn};

use crate::types::CommandSummary;

/// Text sent (ephemerally) when a handler fails.
pub const ERROR_NOTICE: &str = "❌ Something went wrong executing this command.";

pub struct CommandContext {
    interaction: Arc<dyn InteractionHandle>,
    command: String,
    commands: Vec<CommandSummary>,
    replied: AtomicBool,
    deferred: AtomicBool,
}

impl CommandContext {
    pub fn new(
        interaction: Arc<dyn InteractionHandle>,
        command: impl Into<String>,
        commands: Vec<CommandSummary>,
    ) -> Self {
        Self {
            interaction,
            command: command.into(),
            commands,
            replied: AtomicBool::new(false),
            deferred: AtomicBool::new(false),
        }
    }

    // -- Request data --------------------------------------------------------

    /// Normalized (lowercase) name of the invoked command.
    pub fn command_name(&self) -> &str {
        &self.command
    }

    pub fn user(&self) -> &UserRef {
        self.interaction.user()
    }

    pub fn guild(&self) -> Option<&GuildRef> {
        self.interaction.guild()
    }

    pub fn channel(&self) -> &ChannelRef {
        self.interaction.channel()
    }

    /// Snapshot of the registry taken when the interaction was dispatched.
    pub fn commands(&self) -> &[CommandSummary] {
        &self.commands
    }

    pub fn option(&self, name: &str) -> Option<&OptionValue> {
        self.interaction.option(name)
    }

    pub fn get_string(&self, name: &str) -> Option<&str> {
        match self.option(name)? {
            OptionValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn get_integer(&self, name: &str) -> Option<i64> {
        match self.option(name)? {
            OptionValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn get_number(&self, name: &str) -> Option<f64> {
        match self.option(name)? {
            OptionValue::Number(n) => Some(*n),
            OptionValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn get_boolean(&self, name: &str) -> Option<bool> {
        match self.option(name)? {
            OptionValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Id of a user (or mentionable) option.
    pub fn get_user(&self, name: &str) -> Option<u64> {
        match self.option(name)? {
            OptionValue::User(id) | OptionValue::Mentionable(id) => Some(*id),
            _ => None,
        }
    }

    pub fn get_channel(&self, name: &str) -> Option<u64> {
        match self.option(name)? {
            OptionValue::Channel(id) => Some(*id),
            _ => None,
        }
    }

    pub fn get_role(&self, name: &str) -> Option<u64> {
        match self.option(name)? {
            OptionValue::Role(id) | OptionValue::Mentionable(id) => Some(*id),
            _ => None,
        }
    }

    // -- Acknowledgement state ----------------------------------------------

    pub fn is_replied(&self) -> bool {
        self.replied.load(Ordering::SeqCst)
    }

    pub fn is_deferred(&self) -> bool {
        self.deferred.load(Ordering::SeqCst)
    }

    pub fn is_acknowledged(&self) -> bool {
        self.is_replied() || self.is_deferred()
    }

    // -- Responses -----------------------------------------------------------

    /// Send a reply through whichever endpoint is valid right now:
    /// follow-up after a reply, edit after a deferral, otherwise the
    /// initial response.
    ///
    /// On failure a follow-up is attempted once; the original error is
    /// returned only when that fallback fails too.
    pub async fn reply(&self, message: impl Into<OutgoingMessage>) -> Result<(), PlatformError> {
        let message = message.into().normalized();

        let result = if self.is_replied() {
            self.interaction.follow_up(&message).await
        } else if self.is_deferred() {
            self.interaction.edit_response(&message).await
        } else {
            self.interaction.respond(&message).await
        };

        match result {
            Ok(()) => {
                self.replied.store(true, Ordering::SeqCst);
                Ok(())
            }
            Err(e) => {
                error!(command = %self.command, error = %e, "[Context] Reply failed");
                match self.interaction.follow_up(&message).await {
                    Ok(()) => {
                        self.replied.store(true, Ordering::SeqCst);
                        Ok(())
                    }
                    Err(fallback) => {
                        debug!(error = %fallback, "[Context] Fallback follow-up failed");
                        Err(e)
                    }
                }
            }
        }
    }

    /// Edit the existing (or deferred) response.
    pub async fn edit(&self, message: impl Into<OutgoingMessage>) -> Result<(), PlatformError> {
        if !self.is_acknowledged() {
            warn!(command = %self.command, "[Context] Edit before the interaction was acknowledged");
            return Err(PlatformError::NotAcknowledged);
        }
        let message = message.into().normalized();
        match self.interaction.edit_response(&message).await {
            Ok(()) => {
                self.replied.store(true, Ordering::SeqCst);
                Ok(())
            }
            Err(e) => {
                error!(command = %self.command, error = %e, "[Context] Edit failed");
                Err(e)
            }
        }
    }

    /// Update the message a component interaction is attached to.
    pub async fn update(&self, message: impl Into<OutgoingMessage>) -> Result<(), PlatformError> {
        let message = message.into().normalized();
        match self.interaction.update_message(&message).await {
            Ok(()) => {
                self.replied.store(true, Ordering::SeqCst);
                Ok(())
            }
            Err(e) => {
                error!(command = %self.command, error = %e, "[Context] Update failed");
                Err(e)
            }
        }
    }

    /// Acknowledge now, respond later.
    pub async fn defer(&self, ephemeral: bool) -> Result<(), PlatformError> {
        if self.is_acknowledged() {
            return Err(PlatformError::AlreadyAcknowledged);
        }
        self.interaction.defer(ephemeral).await?;
        self.deferred.store(true, Ordering::SeqCst);
        Ok(())
    }

    pub async fn follow_up(&self, message: impl Into<OutgoingMessage>) -> Result<(), PlatformError> {
        if !self.is_acknowledged() {
            return Err(PlatformError::NotAcknowledged);
        }
        let message = message.into().normalized();
        self.interaction.follow_up(&message).await
    }

    /// Last-resort ephemeral error message. Failures are swallowed.
    pub(crate) async fn send_error_notice(&self) {
        let notice = OutgoingMessage::ephemeral(ERROR_NOTICE);
        let result = if self.is_acknowledged() {
            self.interaction.follow_up(&notice).await
        } else {
            self.interaction.respond(&notice).await
        };
        if let Err(e) = result {
            debug!(command = %self.command, error = %e, "[Context] Could not deliver error notice");
        }
    }
}
