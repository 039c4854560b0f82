//! Interaction dispatch: route slash-command interactions to registered handlers.
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use anyhow::Result;
use async_trait::async_trait;
use futures::FutureExt;
use slashforge_core::{CommandAuditSink, InteractionHandle, InteractionKind};
use slashforge_logging::{CommandEvent, CommandEventLogger};
use tracing::{debug, error, warn};

use crate::context::CommandContext;
use crate::registry::SharedRegistry;

// ---------------------------------------------------------------------------
// Handler trait
// ---------------------------------------------------------------------------

#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn execute(&self, ctx: &CommandContext) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Activity tracking
// ---------------------------------------------------------------------------

/// Count of command executions currently in flight.
///
/// Shared with the publish scheduler, which waits for zero before
/// replacing the platform's command set.
#[derive(Debug, Clone, Default)]
pub struct ActivityTracker {
    active: Arc<AtomicUsize>,
}

impl ActivityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark one execution as started. Dropping the guard marks it finished.
    pub fn enter(&self) -> ActivityGuard {
        self.active.fetch_add(1, Ordering::SeqCst);
        ActivityGuard { active: Arc::clone(&self.active) }
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    pub fn is_busy(&self) -> bool {
        self.active() > 0
    }
}

#[must_use = "the execution counts as finished once the guard is dropped"]
pub struct ActivityGuard {
    active: Arc<AtomicUsize>,
}

impl Drop for ActivityGuard {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Not a slash-command interaction.
    Ignored,
    UnknownCommand(String),
    /// The interaction expired before it could be acknowledged.
    Expired,
    Completed,
    Failed(String),
}

pub struct InteractionDispatcher {
    registry: SharedRegistry,
    activity: ActivityTracker,
    audit: Option<Arc<dyn CommandAuditSink>>,
}

impl InteractionDispatcher {
    pub fn new(registry: SharedRegistry, activity: ActivityTracker) -> Self {
        Self { registry, activity, audit: None }
    }

    pub fn with_audit(mut self, audit: Arc<dyn CommandAuditSink>) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn activity(&self) -> &ActivityTracker {
        &self.activity
    }

    pub async fn dispatch(&self, interaction: Arc<dyn InteractionHandle>) -> DispatchOutcome {
        if interaction.kind() != InteractionKind::Command {
            debug!(kind = ?interaction.kind(), "[Dispatch] Ignoring non-command interaction");
            return DispatchOutcome::Ignored;
        }

        let name = interaction.command_name().trim().to_lowercase();
        let (handler, commands) = {
            let registry = self.registry.read().await;
            (registry.handler(&name), registry.list())
        };
        let Some(handler) = handler else {
            warn!("[Dispatch] Unknown slash command: /{}", name);
            return DispatchOutcome::UnknownCommand(name);
        };

        let active = self.activity.enter();
        let started = Instant::now();
        let ctx = CommandContext::new(interaction, name.clone(), commands);
        CommandEventLogger::log_event(&name, CommandEvent::Invoked { user: ctx.user().tag.clone() });

        if let Err(e) = ctx.defer(false).await {
            if e.is_expired() {
                warn!("[Dispatch] Interaction for /{} expired before it was acknowledged", name);
                return DispatchOutcome::Expired;
            }
            error!(command = %name, error = %e, "[Dispatch] Failed to acknowledge interaction");
            return self.finish(&ctx, started, Some(e.to_string()), active).await;
        }

        let outcome = AssertUnwindSafe(handler.execute(&ctx)).catch_unwind().await;
        let failure = match outcome {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(format!("{e:#}")),
            Err(panic) => Some(format!("handler panicked: {}", panic_message(panic.as_ref()))),
        };
        self.finish(&ctx, started, failure, active).await
    }

    async fn finish(
        &self,
        ctx: &CommandContext,
        started: Instant,
        failure: Option<String>,
        active: ActivityGuard,
    ) -> DispatchOutcome {
        let name = ctx.command_name();
        let elapsed_ms = started.elapsed().as_millis() as u64;

        if let Some(msg) = &failure {
            error!(command = %name, error = %msg, "[Dispatch] Command failed");
            ctx.send_error_notice().await;
            CommandEventLogger::log_event(
                name,
                CommandEvent::Failed { error_msg: msg.clone(), elapsed_ms },
            );
        } else {
            CommandEventLogger::log_event(name, CommandEvent::Completed { elapsed_ms });
        }

        // The audit sink may do network I/O; it must not hold off publishes.
        drop(active);
        if let Some(audit) = &self.audit {
            audit.record_command(ctx.guild(), name, ctx.user(), failure.is_none()).await;
        }

        match failure {
            Some(msg) => DispatchOutcome::Failed(msg),
            None => DispatchOutcome::Completed,
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::context::ERROR_NOTICE;
    use crate::registry::CommandRegistry;
    use crate::testing::{Call, FakeInteraction};
    use crate::types::CommandDef;
    use slashforge_core::{GuildRef, OutgoingMessage, UserRef};

    struct Replies(&'static str);

    #[async_trait]
    impl CommandHandler for Replies {
        async fn execute(&self, ctx: &CommandContext) -> Result<()> {
            ctx.reply(self.0).await?;
            Ok(())
        }
    }

    struct Fails;

    #[async_trait]
    impl CommandHandler for Fails {
        async fn execute(&self, _ctx: &CommandContext) -> Result<()> {
            anyhow::bail!("database unreachable")
        }
    }

    struct Panics;

    #[async_trait]
    impl CommandHandler for Panics {
        async fn execute(&self, _ctx: &CommandContext) -> Result<()> {
            panic!("kaboom")
        }
    }

    /// Records the activity count seen from inside the handler.
    struct Observes(ActivityTracker, Arc<Mutex<Option<usize>>>);

    #[async_trait]
    impl CommandHandler for Observes {
        async fn execute(&self, _ctx: &CommandContext) -> Result<()> {
            *self.1.lock().unwrap() = Some(self.0.active());
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingAudit(Mutex<Vec<(Option<u64>, String, bool)>>);

    #[async_trait]
    impl CommandAuditSink for RecordingAudit {
        async fn record_command(
            &self,
            guild: Option<&GuildRef>,
            command: &str,
            _user: &UserRef,
            success: bool,
        ) {
            self.0.lock().unwrap().push((guild.map(|g| g.id), command.to_string(), success));
        }
    }

    async fn dispatcher_with(name: &str, handler: Arc<dyn CommandHandler>) -> InteractionDispatcher {
        let registry = CommandRegistry::shared();
        registry.write().await.register(CommandDef::new(name, "test command", handler)).unwrap();
        InteractionDispatcher::new(registry, ActivityTracker::new())
    }

    #[tokio::test]
    async fn successful_command_defers_then_edits() {
        let dispatcher = dispatcher_with("hello", Arc::new(Replies("hi there"))).await;
        let fake = FakeInteraction::command("Hello").shared();

        let outcome = dispatcher.dispatch(fake.clone()).await;

        assert_eq!(outcome, DispatchOutcome::Completed);
        assert_eq!(
            fake.calls(),
            vec![Call::Defer(false), Call::Edit(OutgoingMessage::text("hi there"))]
        );
        assert_eq!(dispatcher.activity().active(), 0);
    }

    #[tokio::test]
    async fn handler_error_sends_one_ephemeral_notice() {
        let dispatcher = dispatcher_with("broken", Arc::new(Fails)).await;
        let fake = FakeInteraction::command("broken").shared();

        let outcome = dispatcher.dispatch(fake.clone()).await;

        assert!(matches!(outcome, DispatchOutcome::Failed(msg) if msg.contains("database unreachable")));
        assert_eq!(
            fake.calls(),
            vec![Call::Defer(false), Call::FollowUp(OutgoingMessage::ephemeral(ERROR_NOTICE))]
        );
    }

    #[tokio::test]
    async fn handler_panic_is_contained() {
        let dispatcher = dispatcher_with("explode", Arc::new(Panics)).await;
        let fake = FakeInteraction::command("explode").shared();

        let outcome = dispatcher.dispatch(fake.clone()).await;

        assert!(matches!(outcome, DispatchOutcome::Failed(msg) if msg.contains("kaboom")));
        assert_eq!(dispatcher.activity().active(), 0);
        assert_eq!(fake.calls().len(), 2);
    }

    #[tokio::test]
    async fn unknown_command_gets_no_response() {
        let dispatcher = dispatcher_with("known", Arc::new(Replies("x"))).await;
        let fake = FakeInteraction::command("missing").shared();

        let outcome = dispatcher.dispatch(fake.clone()).await;

        assert_eq!(outcome, DispatchOutcome::UnknownCommand("missing".into()));
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn non_command_interactions_are_ignored() {
        let dispatcher = dispatcher_with("known", Arc::new(Replies("x"))).await;
        let fake = FakeInteraction::command("known")
            .with_kind(InteractionKind::Component)
            .shared();

        assert_eq!(dispatcher.dispatch(fake.clone()).await, DispatchOutcome::Ignored);
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn expired_interaction_is_abandoned_silently() {
        let dispatcher = dispatcher_with("slow", Arc::new(Replies("late"))).await;
        let fake = FakeInteraction::command("slow").shared();
        fake.expire_defer();

        assert_eq!(dispatcher.dispatch(fake.clone()).await, DispatchOutcome::Expired);
        assert_eq!(fake.calls(), vec![Call::Defer(false)]);
    }

    #[tokio::test]
    async fn failed_error_notice_is_swallowed() {
        let dispatcher = dispatcher_with("broken", Arc::new(Fails)).await;
        let fake = FakeInteraction::command("broken").shared();
        fake.fail_everything();

        let outcome = dispatcher.dispatch(fake.clone()).await;

        assert!(matches!(outcome, DispatchOutcome::Failed(_)));
        assert_eq!(
            fake.calls(),
            vec![Call::Defer(false), Call::Respond(OutgoingMessage::ephemeral(ERROR_NOTICE))]
        );
    }

    #[tokio::test]
    async fn activity_counts_the_running_command() {
        let tracker = ActivityTracker::new();
        let seen = Arc::new(Mutex::new(None));
        let registry = CommandRegistry::shared();
        registry
            .write()
            .await
            .register(CommandDef::new(
                "watch",
                "observe activity",
                Arc::new(Observes(tracker.clone(), seen.clone())),
            ))
            .unwrap();
        let dispatcher = InteractionDispatcher::new(registry, tracker.clone());

        dispatcher.dispatch(FakeInteraction::command("watch").shared()).await;

        assert_eq!(*seen.lock().unwrap(), Some(1));
        assert!(!tracker.is_busy());
    }

    #[tokio::test]
    async fn audit_sink_sees_success_and_failure() {
        let audit = Arc::new(RecordingAudit::default());
        let registry = CommandRegistry::shared();
        {
            let mut reg = registry.write().await;
            reg.register(CommandDef::new("good", "works", Arc::new(Replies("ok")))).unwrap();
            reg.register(CommandDef::new("bad", "fails", Arc::new(Fails))).unwrap();
        }
        let dispatcher =
            InteractionDispatcher::new(registry, ActivityTracker::new()).with_audit(audit.clone());

        dispatcher.dispatch(FakeInteraction::command("good").shared()).await;
        dispatcher.dispatch(FakeInteraction::command("bad").without_guild().shared()).await;

        assert_eq!(
            *audit.0.lock().unwrap(),
            vec![(Some(42), "good".to_string(), true), (None, "bad".to_string(), false)]
        );
    }

    /// Audit sink that records how many commands were in flight when called.
    struct ActivitySnapshotAudit(ActivityTracker, Mutex<Option<usize>>);

    #[async_trait]
    impl CommandAuditSink for ActivitySnapshotAudit {
        async fn record_command(&self, _guild: Option<&GuildRef>, _command: &str, _user: &UserRef, _success: bool) {
            *self.1.lock().unwrap() = Some(self.0.active());
        }
    }

    #[tokio::test]
    async fn command_is_finished_before_the_audit_record() {
        let tracker = ActivityTracker::new();
        let audit = Arc::new(ActivitySnapshotAudit(tracker.clone(), Mutex::new(None)));
        let registry = CommandRegistry::shared();
        registry
            .write()
            .await
            .register(CommandDef::new("hello", "greets", Arc::new(Replies("hi"))))
            .unwrap();
        let dispatcher = InteractionDispatcher::new(registry, tracker).with_audit(audit.clone());

        dispatcher.dispatch(FakeInteraction::command("hello").shared()).await;

        assert_eq!(*audit.1.lock().unwrap(), Some(0));
    }

    #[test]
    fn guard_drop_decrements() {
        let tracker = ActivityTracker::new();
        let a = tracker.enter();
        let b = tracker.enter();
        assert_eq!(tracker.active(), 2);
        drop(a);
        assert_eq!(tracker.active(), 1);
        drop(b);
        assert!(!tracker.is_busy());
    }
}
