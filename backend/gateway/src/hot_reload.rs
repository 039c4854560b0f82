//! Hot command reload.
//!
//! Watches the commands directory, debounces events per file, re-imports or
//! unloads the affected module and schedules a publish.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use std::time::Duration;

use anyhow::{Context, Result};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use slashforge_commands::{ModuleLoader, is_supported_module};
use tokio::sync::{Mutex, broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::schedule::PublishScheduler;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HotReloadConfig {
    /// Quiet period per file before acting on its events.
    pub debounce: Duration,
    pub stability_poll: Duration,
    pub stability_attempts: u32,
}

impl Default for HotReloadConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(300),
            stability_poll: Duration::from_millis(50),
            stability_attempts: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadEvent {
    Reloaded { path: PathBuf, commands: Vec<String> },
    Unloaded { path: PathBuf, commands: Vec<String> },
    Failed { path: PathBuf, error: String },
}

#[derive(Default)]
struct WatchState {
    enabled: bool,
    watch_task: Option<JoinHandle<()>>,
    /// One debounce timer per path, tagged with the generation that armed it.
    timers: HashMap<PathBuf, (u64, JoinHandle<()>)>,
    next_generation: u64,
}

struct ReloaderInner {
    loader: Arc<ModuleLoader>,
    scheduler: PublishScheduler,
    config: HotReloadConfig,
    state: Mutex<WatchState>,
    events: broadcast::Sender<ReloadEvent>,
}

#[derive(Clone)]
pub struct HotReloader {
    inner: Arc<ReloaderInner>,
}

impl HotReloader {
    pub fn new(loader: Arc<ModuleLoader>, scheduler: PublishScheduler, config: HotReloadConfig) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            inner: Arc::new(ReloaderInner {
                loader,
                scheduler,
                config,
                state: Mutex::new(WatchState::default()),
                events,
            }),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReloadEvent> {
        self.inner.events.subscribe()
    }

    pub async fn is_enabled(&self) -> bool {
        self.inner.state.lock().await.enabled
    }

    /// Start watching the loader's root recursively.
    ///
    /// A missing directory leaves hot reload disabled without an error;
    /// watcher setup failures are returned and also leave it disabled.
    pub async fn start(&self) -> Result<()> {
        self.start_with(|tx| {
            notify::recommended_watcher(move |res| {
                if let Err(e) = tx.blocking_send(res) {
                    error!("[HotReload] Failed to forward file event: {:?}", e);
                }
            })
        })
        .await
    }

    async fn start_with<W, F>(&self, make_watcher: F) -> Result<()>
    where
        W: Watcher + Send + 'static,
        F: FnOnce(mpsc::Sender<notify::Result<Event>>) -> notify::Result<W>,
    {
        let mut state = self.inner.state.lock().await;
        if state.enabled {
            debug!("[HotReload] Already watching");
            return Ok(());
        }

        let root = self.inner.loader.root().to_path_buf();
        if !root.is_dir() {
            warn!("[HotReload] Commands directory {} not found; hot reload disabled", root.display());
            return Ok(());
        }

        let (tx, mut rx) = mpsc::channel(100);
        let mut watcher = make_watcher(tx).context("failed to create file watcher")?;
        watcher
            .watch(&root, RecursiveMode::Recursive)
            .with_context(|| format!("failed to watch {}", root.display()))?;

        let weak = Arc::downgrade(&self.inner);
        state.watch_task = Some(tokio::spawn(async move {
            // keep watcher alive
            let _watcher = watcher;
            while let Some(res) = rx.recv().await {
                match res {
                    Ok(event) => {
                        let Some(inner) = weak.upgrade() else { break };
                        inner.handle_event(event).await;
                    }
                    Err(e) => warn!("[HotReload] Watch error: {:?}", e),
                }
            }
        }));
        state.enabled = true;
        info!("[HotReload] 👀 Watching {} for changes", root.display());
        Ok(())
    }

    /// Stop watching and drop every pending timer. Idempotent.
    pub async fn stop(&self) {
        let mut state = self.inner.state.lock().await;
        if !state.enabled {
            return;
        }
        if let Some(task) = state.watch_task.take() {
            task.abort();
        }
        for (_, (_, timer)) in state.timers.drain() {
            timer.abort();
        }
        state.enabled = false;
        drop(state);

        self.inner.scheduler.cancel_pending().await;
        info!("[HotReload] Stopped");
    }

    /// Record a change to `path`, restarting its debounce timer.
    pub async fn notify_change(&self, path: impl Into<PathBuf>) {
        self.inner.queue(path.into()).await;
    }

    #[cfg(test)]
    pub(crate) async fn enable_without_watcher(&self) {
        self.inner.state.lock().await.enabled = true;
    }
}

impl ReloaderInner {
    async fn handle_event(self: &Arc<Self>, event: Event) {
        if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)) {
            return;
        }
        for path in event.paths {
            if is_supported_module(&path) {
                self.queue(path).await;
            }
        }
    }

    async fn queue(self: &Arc<Self>, path: PathBuf) {
        let mut state = self.state.lock().await;
        if !state.enabled {
            return;
        }
        state.next_generation += 1;
        let generation = state.next_generation;
        if let Some((_, previous)) = state.timers.remove(&path) {
            previous.abort();
        }

        let weak: Weak<Self> = Arc::downgrade(self);
        let debounce = self.config.debounce;
        let target = path.clone();
        let timer = tokio::spawn(async move {
            sleep(debounce).await;
            if let Some(inner) = weak.upgrade() {
                inner.fire(target, generation).await;
            }
        });
        state.timers.insert(path, (generation, timer));
    }

    async fn fire(&self, path: PathBuf, generation: u64) {
        {
            let mut state = self.state.lock().await;
            let armed = state.timers.get(&path).map(|(armed, _)| *armed);
            if armed != Some(generation) {
                return;
            }
            state.timers.remove(&path);
        }

        let rel = self.loader.relative(&path);
        let (event, publish) = if path.exists() {
            if !self.wait_for_stability(&path).await {
                debug!("[HotReload] {} still changing; reloading anyway", rel);
            }
            if !self.state.lock().await.enabled {
                debug!("[HotReload] Stopped while waiting on {}; skipping reload", rel);
                return;
            }
            match self.loader.reload_file(&path).await {
                Ok(commands) => {
                    info!("[HotReload] 🔄 Reloaded {} ({})", rel, commands.join(", "));
                    (ReloadEvent::Reloaded { path, commands }, true)
                }
                Err(e) => {
                    error!(file = %rel, error = %e, "[HotReload] Reload failed; keeping previous commands");
                    (ReloadEvent::Failed { path, error: e.to_string() }, false)
                }
            }
        } else {
            let commands = self.loader.unload_file(&path).await;
            info!("[HotReload] 🗑️ Unloaded {} ({})", rel, commands.join(", "));
            (ReloadEvent::Unloaded { path, commands }, true)
        };

        // Held across schedule() so a concurrent stop() either sees the
        // pending publish and cancels it or has already disabled us.
        let state = self.state.lock().await;
        if !state.enabled {
            debug!("[HotReload] Stopped during reload of {}; not publishing", rel);
            return;
        }
        if publish {
            self.scheduler.schedule().await;
        }
        drop(state);
        let _ = self.events.send(event);
    }

    /// Poll the file size until two consecutive reads agree.
    async fn wait_for_stability(&self, path: &Path) -> bool {
        let mut last = None;
        for _ in 0..self.config.stability_attempts {
            let size = std::fs::metadata(path).map(|m| m.len()).ok();
            if size.is_some() && size == last {
                return true;
            }
            last = size;
            sleep(self.config.stability_poll).await;
        }
        false
    }
}
