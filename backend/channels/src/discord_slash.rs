//! Discord Slash Commands
//!
//! Bulk-overwrites the application's global commands.

use std::sync::Arc;

use async_trait::async_trait;
use slashforge_core::{CommandPublisher, PlatformError, WireCommand};
use tracing::debug;

use crate::discord::{DiscordHandles, platform_error};

pub struct SerenityPublisher {
    handles: Arc<DiscordHandles>,
}

impl SerenityPublisher {
    pub fn new(handles: Arc<DiscordHandles>) -> Self {
        Self { handles }
    }
}

#[async_trait]
impl CommandPublisher for SerenityPublisher {
    fn is_ready(&self) -> bool {
        self.handles.http().is_some()
    }

    async fn set_commands(&self, commands: &[WireCommand]) -> Result<(), PlatformError> {
        let http = self.handles.http().ok_or(PlatformError::NotReady)?;
        // The wire shape already matches Discord's application command JSON.
        let created = http.create_global_commands(&commands).await.map_err(platform_error)?;
        debug!("Discord acknowledged {} global commands", created.len());
        Ok(())
    }
}
