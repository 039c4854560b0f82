//! Remote Command Publisher
//!
//! Pushes the full registry to the platform's bulk "replace all commands"
//! endpoint. Always a full replace; the platform has no incremental API.

use std::sync::Arc;

use slashforge_commands::SharedRegistry;
use slashforge_core::CommandPublisher;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishPolicy {
    /// Skip the remote call when the registry is empty instead of
    /// deregistering every command.
    pub skip_empty: bool,
}

impl Default for PublishPolicy {
    fn default() -> Self {
        Self { skip_empty: true }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    Published(usize),
    SkippedEmpty,
    NotReady,
    Failed(String),
}

pub struct RemoteCommandPublisher {
    registry: SharedRegistry,
    remote: Arc<dyn CommandPublisher>,
    policy: PublishPolicy,
    in_flight: Mutex<()>,
}

impl RemoteCommandPublisher {
    pub fn new(
        registry: SharedRegistry,
        remote: Arc<dyn CommandPublisher>,
        policy: PublishPolicy,
    ) -> Self {
        Self { registry, remote, policy, in_flight: Mutex::new(()) }
    }

    pub fn is_ready(&self) -> bool {
        self.remote.is_ready()
    }

    /// Publish the current registry. Concurrent calls run one at a time.
    pub async fn publish(&self) -> PublishOutcome {
        let _in_flight = self.in_flight.lock().await;

        if !self.remote.is_ready() {
            debug!("[Publish] Platform client not ready; skipping");
            return PublishOutcome::NotReady;
        }

        let commands = self.registry.read().await.wire_commands();
        if commands.is_empty() && self.policy.skip_empty {
            warn!("[Publish] No commands registered; skipping publish");
            return PublishOutcome::SkippedEmpty;
        }

        info!("[Publish] Registering {} slash commands", commands.len());
        match self.remote.set_commands(&commands).await {
            Ok(()) => {
                info!("[Publish] ✅ Registered {} slash commands", commands.len());
                PublishOutcome::Published(commands.len())
            }
            Err(e) => {
                error!(error = %e, "[Publish] ❌ Failed to register commands");
                PublishOutcome::Failed(e.to_string())
            }
        }
    }
}
