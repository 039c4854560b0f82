//! Bot runtime: wires the dispatcher, publish scheduler and hot reloader
//! behind the platform adapter's event sink.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use slashforge_commands::{ActivityTracker, InteractionDispatcher, LoadReport, ModuleLoader};
use slashforge_core::{CommandAuditSink, CommandPublisher, InteractionHandle, InteractionSink};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::hot_reload::{HotReloadConfig, HotReloader};
use crate::publisher::{PublishPolicy, RemoteCommandPublisher};
use crate::schedule::{PublishScheduler, ScheduleConfig};

#[derive(Debug, Clone)]
pub struct RuntimeOptions {
    pub hot_reload: bool,
    /// Delay between the ready event and starting the watcher.
    pub hot_reload_start_delay: Duration,
    pub reload: HotReloadConfig,
    pub schedule: ScheduleConfig,
    pub policy: PublishPolicy,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            hot_reload: true,
            hot_reload_start_delay: Duration::from_millis(1000),
            reload: HotReloadConfig::default(),
            schedule: ScheduleConfig::default(),
            policy: PublishPolicy::default(),
        }
    }
}

pub struct BotRuntime {
    loader: Arc<ModuleLoader>,
    dispatcher: InteractionDispatcher,
    scheduler: PublishScheduler,
    reloader: HotReloader,
    options: RuntimeOptions,
    ready_seen: AtomicBool,
    reload_start: Mutex<Option<JoinHandle<()>>>,
}

impl BotRuntime {
    pub fn new(
        loader: Arc<ModuleLoader>,
        remote: Arc<dyn CommandPublisher>,
        audit: Option<Arc<dyn CommandAuditSink>>,
        options: RuntimeOptions,
    ) -> Self {
        let registry = loader.registry().clone();
        let activity = ActivityTracker::new();

        let mut dispatcher = InteractionDispatcher::new(registry.clone(), activity.clone());
        if let Some(audit) = audit {
            dispatcher = dispatcher.with_audit(audit);
        }
        let publisher = Arc::new(RemoteCommandPublisher::new(registry, remote, options.policy));
        let scheduler = PublishScheduler::new(publisher, activity, options.schedule);
        let reloader = HotReloader::new(loader.clone(), scheduler.clone(), options.reload);

        Self {
            loader,
            dispatcher,
            scheduler,
            reloader,
            options,
            ready_seen: AtomicBool::new(false),
            reload_start: Mutex::new(None),
        }
    }

    /// Initial load of every module under the commands root.
    pub async fn load_commands(&self) -> LoadReport {
        info!("[Runtime] Loading commands from {}", self.loader.root().display());
        self.loader.load_all().await
    }

    pub fn dispatcher(&self) -> &InteractionDispatcher {
        &self.dispatcher
    }

    pub fn scheduler(&self) -> &PublishScheduler {
        &self.scheduler
    }

    pub fn reloader(&self) -> &HotReloader {
        &self.reloader
    }

    pub async fn shutdown(&self) {
        if let Some(task) = self.reload_start.lock().await.take() {
            task.abort();
        }
        self.reloader.stop().await;
        self.scheduler.cancel_pending().await;
        info!("[Runtime] Shut down");
    }
}

#[async_trait]
impl InteractionSink for BotRuntime {
    async fn on_ready(&self) {
        if self.ready_seen.swap(true, Ordering::SeqCst) {
            debug!("[Runtime] Reconnected; commands already published");
            return;
        }

        self.scheduler.publish_now().await;

        if !self.options.hot_reload {
            info!("[Runtime] Hot reload disabled");
            return;
        }
        let reloader = self.reloader.clone();
        let delay = self.options.hot_reload_start_delay;
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = reloader.start().await {
                error!(error = ?e, "[HotReload] Failed to start watcher; hot reload disabled");
            }
        });
        *self.reload_start.lock().await = Some(task);
    }

    async fn on_interaction(&self, interaction: Arc<dyn InteractionHandle>) {
        let outcome = self.dispatcher.dispatch(interaction).await;
        debug!(?outcome, "[Runtime] Interaction handled");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publisher::tests::RecordingPublisher;
    use slashforge_commands::{CommandRegistry, HandlerTable};
    use std::fs;
    use tempfile::TempDir;

    fn runtime(dir: &TempDir, hot_reload: bool) -> (BotRuntime, Arc<RecordingPublisher>) {
        let loader = Arc::new(ModuleLoader::new(
            dir.path(),
            CommandRegistry::shared(),
            HandlerTable::with_builtins(),
        ));
        let remote = RecordingPublisher::new();
        let options = RuntimeOptions { hot_reload, ..RuntimeOptions::default() };
        (BotRuntime::new(loader, remote.clone(), None, options), remote)
    }

    #[tokio::test]
    async fn ready_publishes_loaded_commands_once() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("ping.toml"),
            "name = \"ping\"\ndescription = \"Ping\"\nhandler = \"ping\"\n",
        )
        .unwrap();
        let (runtime, remote) = runtime(&dir, false);

        let report = runtime.load_commands().await;
        runtime.on_ready().await;
        runtime.on_ready().await;

        assert_eq!(report.registered, ["ping"]);
        assert_eq!(remote.call_count(), 1);
        assert!(!runtime.reloader().is_enabled().await);
    }

    #[tokio::test(start_paused = true)]
    async fn hot_reload_starts_after_the_ready_delay() {
        let dir = TempDir::new().unwrap();
        let (runtime, _remote) = runtime(&dir, true);

        runtime.on_ready().await;
        assert!(!runtime.reloader().is_enabled().await);

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(runtime.reloader().is_enabled().await);

        runtime.shutdown().await;
        assert!(!runtime.reloader().is_enabled().await);
    }
}
