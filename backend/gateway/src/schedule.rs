//! Publish Scheduler
//!
//! Coalesces publish requests into at most one pending timer, spaces remote
//! calls by a cooldown, and holds off while commands are executing.

use std::sync::Arc;
use std::time::Duration;

use slashforge_commands::ActivityTracker;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep};
use tracing::debug;

use crate::publisher::{PublishOutcome, RemoteCommandPublisher};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleConfig {
    /// Minimum spacing between the starts of two remote publishes.
    pub cooldown: Duration,
    /// How long to wait before re-checking while commands are in flight.
    pub busy_recheck: Duration,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self { cooldown: Duration::from_millis(3000), busy_recheck: Duration::from_millis(1000) }
    }
}

#[derive(Default)]
struct ScheduleState {
    generation: u64,
    /// Not-yet-started publish. Cleared by the task itself right before the
    /// remote call, so a running publish is never aborted.
    pending: Option<JoinHandle<()>>,
    last_publish: Option<Instant>,
}

struct SchedulerInner {
    publisher: Arc<RemoteCommandPublisher>,
    activity: ActivityTracker,
    config: ScheduleConfig,
    state: Mutex<ScheduleState>,
}

#[derive(Clone)]
pub struct PublishScheduler {
    inner: Arc<SchedulerInner>,
}

impl PublishScheduler {
    pub fn new(
        publisher: Arc<RemoteCommandPublisher>,
        activity: ActivityTracker,
        config: ScheduleConfig,
    ) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                publisher,
                activity,
                config,
                state: Mutex::new(ScheduleState::default()),
            }),
        }
    }

    /// Request a publish. Replaces any pending (not yet started) request.
    ///
    /// Ignored until the platform client is ready; the initial publish on
    /// ready covers everything registered before that.
    pub async fn schedule(&self) {
        if !self.inner.publisher.is_ready() {
            debug!("[Publish] Client not ready; ignoring publish request");
            return;
        }

        let mut state = self.inner.state.lock().await;
        state.generation += 1;
        let generation = state.generation;
        if let Some(previous) = state.pending.take() {
            previous.abort();
            debug!("[Publish] Replaced pending publish");
        }

        let inner = Arc::clone(&self.inner);
        state.pending = Some(tokio::spawn(async move { inner.run(generation).await }));
    }

    /// Cancel any pending request and publish immediately.
    pub async fn publish_now(&self) -> PublishOutcome {
        {
            let mut state = self.inner.state.lock().await;
            state.generation += 1;
            if let Some(previous) = state.pending.take() {
                previous.abort();
            }
            state.last_publish = Some(Instant::now());
        }
        self.inner.publisher.publish().await
    }

    /// Drop the pending request, if any. Returns whether one was pending.
    pub async fn cancel_pending(&self) -> bool {
        let mut state = self.inner.state.lock().await;
        match state.pending.take() {
            Some(handle) => {
                handle.abort();
                debug!("[Publish] Cancelled pending publish");
                true
            }
            None => false,
        }
    }

    pub async fn has_pending(&self) -> bool {
        self.inner.state.lock().await.pending.is_some()
    }

    pub async fn last_publish(&self) -> Option<Instant> {
        self.inner.state.lock().await.last_publish
    }
}

impl SchedulerInner {
    async fn run(&self, generation: u64) {
        loop {
            while self.activity.is_busy() {
                debug!(
                    active = self.activity.active(),
                    "[Publish] Commands in flight; re-checking in {:?}", self.config.busy_recheck
                );
                sleep(self.config.busy_recheck).await;
            }

            let wait = {
                let state = self.state.lock().await;
                state
                    .last_publish
                    .map(|last| self.config.cooldown.saturating_sub(last.elapsed()))
                    .unwrap_or(Duration::ZERO)
            };
            if wait.is_zero() {
                break;
            }
            debug!("[Publish] Cooldown active; publishing in {:?}", wait);
            sleep(wait).await;
        }

        {
            let mut state = self.state.lock().await;
            if state.generation != generation {
                return;
            }
            state.pending = None;
            state.last_publish = Some(Instant::now());
        }
        self.publisher.publish().await;
    }
}
