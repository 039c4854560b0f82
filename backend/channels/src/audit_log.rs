//! Guild Audit Log
//!
//! Posts command executions and bot notices as embeds into a per-guild text
//! channel (`bot-logs` by default), creating the channel when allowed.
//! Channel resolutions are cached per guild, including negative results.
//! Lookup errors are not cached, and a failed send drops the entry so the
//! next log resolves the channel again.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use slashforge_core::{CommandAuditSink, Embed, GuildRef, LogChannelDirectory, PlatformError, UserRef};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

pub const DEFAULT_LOG_CHANNEL: &str = "bot-logs";
const CHANNEL_TOPIC: &str = "🤖 Bot activity logs";
const FOOTER: &str = "🤖 Slashforge Bot";

pub const COLOR_INFO: u32 = 0x5865F2;
pub const COLOR_SUCCESS: u32 = 0x57F287;
pub const COLOR_WARNING: u32 = 0xFEE75C;
pub const COLOR_ERROR: u32 = 0xED4245;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditLogConfig {
    pub channel_name: String,
    pub auto_create_channel: bool,
}

impl Default for AuditLogConfig {
    fn default() -> Self {
        Self { channel_name: DEFAULT_LOG_CHANNEL.to_string(), auto_create_channel: true }
    }
}

/// Resolution state of one guild: `None` until resolved, then the channel
/// id or `Some(None)` when the guild has no usable channel.
type GuildSlot = Arc<Mutex<Option<Option<u64>>>>;

pub struct GuildAuditLogger<D> {
    directory: D,
    config: AuditLogConfig,
    /// Only held to fetch a guild's slot, never across platform calls.
    channels: Mutex<HashMap<u64, GuildSlot>>,
}

impl<D: LogChannelDirectory> GuildAuditLogger<D> {
    pub fn new(directory: D, config: AuditLogConfig) -> Self {
        Self { directory, config, channels: Mutex::new(HashMap::new()) }
    }

    /// Find (or create) the guild's log channel.
    ///
    /// Concurrent calls for the same guild wait on one resolution; other
    /// guilds are not blocked by it.
    pub async fn log_channel(&self, guild: &GuildRef) -> Option<u64> {
        let slot = Arc::clone(self.channels.lock().await.entry(guild.id).or_default());
        let mut entry = slot.lock().await;
        if let Some(cached) = *entry {
            return cached;
        }
        match self.resolve(guild).await {
            Ok(resolved) => {
                *entry = Some(resolved);
                resolved
            }
            Err(e) => {
                error!(guild = guild.id, error = %e, "[AuditLog] Failed to look up log channel");
                None
            }
        }
    }

    /// Forget the cached channel for a guild, e.g. after it was deleted.
    pub async fn forget(&self, guild_id: u64) {
        self.channels.lock().await.remove(&guild_id);
    }

    async fn resolve(&self, guild: &GuildRef) -> Result<Option<u64>, PlatformError> {
        let guild_name = guild.name.as_deref().unwrap_or("unknown guild");
        if let Some(id) = self.directory.find_text_channel(guild.id, &self.config.channel_name).await? {
            return Ok(Some(id));
        }

        if !self.config.auto_create_channel {
            return Ok(None);
        }
        if !self.directory.can_manage_channels(guild.id).await {
            warn!("[AuditLog] Missing MANAGE_CHANNELS permission in {}, skipping log channel creation", guild_name);
            return Ok(None);
        }

        match self
            .directory
            .create_text_channel(guild.id, &self.config.channel_name, CHANNEL_TOPIC)
            .await
        {
            Ok(id) => {
                info!("[AuditLog] Created log channel in {}", guild_name);
                Ok(Some(id))
            }
            Err(e) => {
                error!(guild = guild.id, error = %e, "[AuditLog] Failed to create log channel");
                Ok(None)
            }
        }
    }

    /// Send an embed to the guild's log channel. Failures are only logged.
    pub async fn log(&self, guild: &GuildRef, embed: Embed) {
        let Some(channel) = self.log_channel(guild).await else { return };
        let embed = Embed { timestamp: true, ..embed }.footer(FOOTER);
        if let Err(e) = self.directory.send_embed(channel, &embed).await {
            error!(guild = guild.id, channel, error = %e, "[AuditLog] Failed to send log");
            self.forget(guild.id).await;
        }
    }

    pub async fn log_command(&self, guild: &GuildRef, command: &str, user: &UserRef, success: bool) {
        let (emoji, color, status) = if success {
            ("✅", COLOR_SUCCESS, "Success")
        } else {
            ("❌", COLOR_ERROR, "Failed")
        };
        let embed = Embed::new()
            .description(format!("{emoji} Command executed"))
            .color(color)
            .field("Command", format!("/{command}"), true)
            .field("User", user.tag.clone(), true)
            .field("Status", status, true);
        self.log(guild, embed).await;
    }

    pub async fn log_error(&self, guild: &GuildRef, context: &str, error: &str) {
        let context = if context.is_empty() { "Unknown" } else { context };
        let embed = Embed::new()
            .title("⚠️ Error")
            .description("❌ Error occurred")
            .color(COLOR_ERROR)
            .field("Context", context, false)
            .field("Error", error, false);
        self.log(guild, embed).await;
    }

    pub async fn log_info(&self, guild: &GuildRef, message: &str) {
        self.log_titled(guild, message, "ℹ️ Info", COLOR_INFO).await;
    }

    pub async fn log_warning(&self, guild: &GuildRef, message: &str) {
        self.log_titled(guild, message, "⚠️ Warning", COLOR_WARNING).await;
    }

    pub async fn log_success(&self, guild: &GuildRef, message: &str) {
        self.log_titled(guild, message, "✅ Success", COLOR_SUCCESS).await;
    }

    async fn log_titled(&self, guild: &GuildRef, message: &str, title: &str, color: u32) {
        self.log(guild, Embed::new().title(title).description(message).color(color)).await;
    }
}

#[async_trait]
impl<D: LogChannelDirectory> CommandAuditSink for GuildAuditLogger<D> {
    async fn record_command(
        &self,
        guild: Option<&GuildRef>,
        command: &str,
        user: &UserRef,
        success: bool,
    ) {
        // Direct messages have no log channel.
        if let Some(guild) = guild {
            self.log_command(guild, command, user, success).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeDirectory {
        existing: Option<u64>,
        can_manage: bool,
        fail_create: bool,
        fail_send: AtomicBool,
        /// Number of upcoming lookups that fail.
        failing_lookups: AtomicUsize,
        /// Guild whose lookup never completes.
        stalled_guild: Option<u64>,
        lookups: AtomicUsize,
        creates: AtomicUsize,
        sent: StdMutex<Vec<(u64, Embed)>>,
    }

    #[async_trait]
    impl LogChannelDirectory for FakeDirectory {
        async fn find_text_channel(&self, guild_id: u64, name: &str) -> Result<Option<u64>, PlatformError> {
            assert_eq!(name, DEFAULT_LOG_CHANNEL);
            self.lookups.fetch_add(1, Ordering::SeqCst);
            if self.stalled_guild == Some(guild_id) {
                std::future::pending::<()>().await;
            }
            let failing = self.failing_lookups.load(Ordering::SeqCst);
            if failing > 0 {
                self.failing_lookups.store(failing - 1, Ordering::SeqCst);
                return Err(PlatformError::Request("502 Bad Gateway".into()));
            }
            Ok(self.existing)
        }

        async fn can_manage_channels(&self, _guild_id: u64) -> bool {
            self.can_manage
        }

        async fn create_text_channel(&self, _guild_id: u64, _name: &str, _topic: &str) -> Result<u64, PlatformError> {
            self.creates.fetch_add(1, Ordering::SeqCst);
            if self.fail_create {
                return Err(PlatformError::Request("500".into()));
            }
            Ok(900)
        }

        async fn send_embed(&self, channel_id: u64, embed: &Embed) -> Result<(), PlatformError> {
            if self.fail_send.load(Ordering::SeqCst) {
                return Err(PlatformError::Request("gone".into()));
            }
            self.sent.lock().unwrap().push((channel_id, embed.clone()));
            Ok(())
        }
    }

    fn guild(id: u64) -> GuildRef {
        GuildRef { id, name: Some(format!("Guild {id}")) }
    }

    async fn cached(logger: &GuildAuditLogger<FakeDirectory>, guild_id: u64) -> Option<Option<u64>> {
        let slot = logger.channels.lock().await.get(&guild_id).cloned()?;
        let entry = *slot.lock().await;
        entry
    }

    fn logger(directory: FakeDirectory, auto_create: bool) -> GuildAuditLogger<FakeDirectory> {
        GuildAuditLogger::new(
            directory,
            AuditLogConfig { auto_create_channel: auto_create, ..AuditLogConfig::default() },
        )
    }

    #[tokio::test]
    async fn skips_creation_when_disabled() {
        let logger = logger(FakeDirectory { can_manage: true, ..Default::default() }, false);

        assert_eq!(logger.log_channel(&guild(1)).await, None);
        assert_eq!(logger.directory.creates.load(Ordering::SeqCst), 0);
        assert_eq!(cached(&logger, 1).await, Some(None));
    }

    #[tokio::test]
    async fn caches_missing_permission() {
        let logger = logger(FakeDirectory::default(), true);

        assert_eq!(logger.log_channel(&guild(2)).await, None);
        assert_eq!(logger.log_channel(&guild(2)).await, None);

        assert_eq!(logger.directory.creates.load(Ordering::SeqCst), 0);
        assert_eq!(logger.directory.lookups.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn creates_channel_when_permitted() {
        let logger = logger(FakeDirectory { can_manage: true, ..Default::default() }, true);

        assert_eq!(logger.log_channel(&guild(3)).await, Some(900));
        assert_eq!(logger.directory.creates.load(Ordering::SeqCst), 1);
        assert_eq!(cached(&logger, 3).await, Some(Some(900)));
    }

    #[tokio::test]
    async fn failed_creation_is_cached_as_missing() {
        let logger = logger(
            FakeDirectory { can_manage: true, fail_create: true, ..Default::default() },
            true,
        );

        assert_eq!(logger.log_channel(&guild(4)).await, None);
        assert_eq!(logger.log_channel(&guild(4)).await, None);
        assert_eq!(logger.directory.creates.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn existing_channel_receives_embeds() {
        let logger = logger(FakeDirectory { existing: Some(55), ..Default::default() }, true);

        logger.log(&guild(5), Embed::new().title("Greeting").description("Hello world")).await;

        let sent = logger.directory.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        let (channel, embed) = &sent[0];
        assert_eq!(*channel, 55);
        assert_eq!(embed.description.as_deref(), Some("Hello world"));
        assert_eq!(embed.title.as_deref(), Some("Greeting"));
        assert!(embed.timestamp);
        assert_eq!(embed.footer.as_deref(), Some(FOOTER));
    }

    #[tokio::test]
    async fn command_record_shows_status() {
        let logger = logger(FakeDirectory { existing: Some(1), ..Default::default() }, true);
        let user = UserRef { id: 9, tag: "ada".into() };

        logger.record_command(Some(&guild(6)), "ping", &user, false).await;
        logger.record_command(None, "ping", &user, true).await;

        let sent = logger.directory.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        let embed = &sent[0].1;
        assert_eq!(embed.color, Some(COLOR_ERROR));
        assert_eq!(embed.fields[0].value, Value::from("/ping"));
        assert_eq!(embed.fields[2].value, Value::from("Failed"));
    }

    #[tokio::test]
    async fn notice_helpers_use_their_titles() {
        let logger = logger(FakeDirectory { existing: Some(1), ..Default::default() }, true);
        let g = guild(8);

        logger.log_error(&g, "", "disk full").await;
        logger.log_warning(&g, "slow").await;
        logger.log_success(&g, "online").await;

        let sent = logger.directory.sent.lock().unwrap();
        let titles: Vec<_> = sent.iter().map(|(_, e)| e.title.clone().unwrap()).collect();
        assert_eq!(titles, ["⚠️ Error", "⚠️ Warning", "✅ Success"]);
        assert_eq!(sent[0].1.fields[0].value, Value::from("Unknown"));
    }

    #[tokio::test]
    async fn send_failure_is_swallowed() {
        let directory = FakeDirectory { existing: Some(1), ..Default::default() };
        directory.fail_send.store(true, Ordering::SeqCst);
        let logger = logger(directory, true);

        logger.log_info(&guild(7), "still alive").await;

        assert!(logger.directory.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn lookup_error_is_retried_on_next_log() {
        let directory = FakeDirectory { existing: Some(77), ..Default::default() };
        directory.failing_lookups.store(1, Ordering::SeqCst);
        let logger = logger(directory, true);

        assert_eq!(logger.log_channel(&guild(10)).await, None);
        assert_eq!(cached(&logger, 10).await, None);
        assert_eq!(logger.log_channel(&guild(10)).await, Some(77));
        assert_eq!(logger.directory.lookups.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_send_drops_the_cached_channel() {
        let directory = FakeDirectory { existing: Some(12), ..Default::default() };
        directory.fail_send.store(true, Ordering::SeqCst);
        let logger = logger(directory, true);

        logger.log_info(&guild(11), "first").await;
        assert_eq!(cached(&logger, 11).await, None);

        logger.directory.fail_send.store(false, Ordering::SeqCst);
        logger.log_info(&guild(11), "second").await;

        assert_eq!(logger.directory.lookups.load(Ordering::SeqCst), 2);
        assert_eq!(logger.directory.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn stalled_guild_does_not_block_other_guilds() {
        let logger = Arc::new(logger(
            FakeDirectory { existing: Some(5), stalled_guild: Some(20), ..Default::default() },
            true,
        ));

        let stalled = {
            let logger = Arc::clone(&logger);
            tokio::spawn(async move { logger.log_channel(&guild(20)).await })
        };
        tokio::task::yield_now().await;

        let other = tokio::time::timeout(Duration::from_secs(1), logger.log_channel(&guild(21))).await;
        assert_eq!(other.ok(), Some(Some(5)));
        assert!(!stalled.is_finished());
        stalled.abort();
    }
}
