use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use serenity::all::{
    ChannelId, ChannelType, CommandDataOptionValue, CommandInteraction, CreateChannel, CreateInteractionResponse,
    CreateInteractionResponseMessage, GuildId, HttpError, Interaction, ShardManager,
};
use serenity::cache::Cache;
use serenity::http::Http;
use serenity::model::gateway::Ready;
use serenity::prelude::*;
use slashforge_core::{
    ChannelRef, Embed, GuildRef, InteractionHandle, InteractionKind, InteractionSink,
    LogChannelDirectory, OptionValue, OutgoingMessage, PlatformError, UserRef,
};
use tracing::{debug, error, info};

use crate::ChannelAdapter;
use crate::discord_embeds::DiscordEmbeds;
use crate::discord_slash::SerenityPublisher;

/// Discord JSON error codes the framework reacts to.
const UNKNOWN_INTERACTION: isize = 10062;
const ALREADY_ACKNOWLEDGED: isize = 40060;
const MISSING_PERMISSIONS: isize = 50013;

pub(crate) fn platform_error(err: serenity::Error) -> PlatformError {
    if let serenity::Error::Http(HttpError::UnsuccessfulRequest(response)) = &err {
        match response.error.code {
            UNKNOWN_INTERACTION => return PlatformError::InteractionExpired,
            ALREADY_ACKNOWLEDGED => return PlatformError::AlreadyAcknowledged,
            MISSING_PERMISSIONS => {
                return PlatformError::MissingPermission(response.error.message.clone());
            }
            _ => {}
        }
    }
    PlatformError::Request(err.to_string())
}

// ---------------------------------------------------------------------------
// Shared client handles
// ---------------------------------------------------------------------------

/// Client handles that only exist once the gateway session is ready.
#[derive(Default)]
pub struct DiscordHandles {
    http: OnceLock<Arc<Http>>,
    cache: OnceLock<Arc<Cache>>,
    shards: OnceLock<Arc<ShardManager>>,
}

impl DiscordHandles {
    pub fn http(&self) -> Option<&Arc<Http>> {
        self.http.get()
    }

    pub fn cache(&self) -> Option<&Arc<Cache>> {
        self.cache.get()
    }

    fn attach(&self, ctx: &Context) {
        let _ = self.http.set(Arc::clone(&ctx.http));
        let _ = self.cache.set(Arc::clone(&ctx.cache));
    }

    fn http_or_not_ready(&self) -> Result<&Arc<Http>, PlatformError> {
        self.http().ok_or(PlatformError::NotReady)
    }
}

// ---------------------------------------------------------------------------
// Gateway event handler
// ---------------------------------------------------------------------------

struct Handler {
    handles: Arc<DiscordHandles>,
    sink: Arc<dyn InteractionSink>,
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("{} is connected!", ready.user.name);
        ctx.http.set_application_id(ready.application.id);
        self.handles.attach(&ctx);
        self.sink.on_ready().await;
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        match interaction {
            Interaction::Command(command) => {
                let handle = SerenityInteraction::new(&ctx, command);
                self.sink.on_interaction(Arc::new(handle)).await;
            }
            other => debug!(kind = ?other.kind(), "Ignoring non-command interaction"),
        }
    }
}

pub struct DiscordAdapter {
    token: String,
    handles: Arc<DiscordHandles>,
}

impl DiscordAdapter {
    pub fn new(token: String) -> Self {
        Self { token, handles: Arc::new(DiscordHandles::default()) }
    }

    pub fn handles(&self) -> Arc<DiscordHandles> {
        Arc::clone(&self.handles)
    }

    /// Bulk command registration backed by this adapter's client.
    pub fn publisher(&self) -> Arc<SerenityPublisher> {
        Arc::new(SerenityPublisher::new(self.handles()))
    }

    pub fn log_directory(&self) -> SerenityLogDirectory {
        SerenityLogDirectory { handles: self.handles() }
    }

    /// Close every shard; `start` returns afterwards.
    pub async fn shutdown(&self) {
        if let Some(shards) = self.handles.shards.get() {
            shards.shutdown_all().await;
        }
    }
}

#[async_trait]
impl ChannelAdapter for DiscordAdapter {
    fn name(&self) -> &str {
        "discord"
    }

    async fn start(&self, sink: Arc<dyn InteractionSink>) -> anyhow::Result<()> {
        info!("Starting Discord adapter");

        let intents = GatewayIntents::GUILDS;
        let mut client = Client::builder(&self.token, intents)
            .event_handler(Handler { handles: self.handles(), sink })
            .await?;
        let _ = self.handles.shards.set(Arc::clone(&client.shard_manager));

        if let Err(why) = client.start().await {
            error!("Client error: {:?}", why);
            anyhow::bail!("Discord client error: {:?}", why);
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Interaction handle
// ---------------------------------------------------------------------------

pub struct SerenityInteraction {
    http: Arc<Http>,
    command: CommandInteraction,
    user: UserRef,
    guild: Option<GuildRef>,
    channel: ChannelRef,
    options: HashMap<String, OptionValue>,
}

impl SerenityInteraction {
    pub fn new(ctx: &Context, command: CommandInteraction) -> Self {
        let user = UserRef { id: command.user.id.get(), tag: command.user.tag() };
        let guild = command.guild_id.map(|id| GuildRef {
            id: id.get(),
            name: ctx.cache.guild(id).map(|g| g.name.clone()),
        });
        let channel = ChannelRef { id: command.channel_id.get() };
        let options = command
            .data
            .options
            .iter()
            .filter_map(|opt| option_value(&opt.value).map(|value| (opt.name.clone(), value)))
            .collect();

        Self { http: Arc::clone(&ctx.http), command, user, guild, channel, options }
    }
}

fn option_value(value: &CommandDataOptionValue) -> Option<OptionValue> {
    Some(match value {
        CommandDataOptionValue::String(s) => OptionValue::String(s.clone()),
        CommandDataOptionValue::Integer(i) => OptionValue::Integer(*i),
        CommandDataOptionValue::Number(n) => OptionValue::Number(*n),
        CommandDataOptionValue::Boolean(b) => OptionValue::Boolean(*b),
        CommandDataOptionValue::User(id) => OptionValue::User(id.get()),
        CommandDataOptionValue::Channel(id) => OptionValue::Channel(id.get()),
        CommandDataOptionValue::Role(id) => OptionValue::Role(id.get()),
        CommandDataOptionValue::Mentionable(id) => OptionValue::Mentionable(id.get()),
        CommandDataOptionValue::Attachment(id) => OptionValue::Attachment(id.get()),
        _ => return None,
    })
}

#[async_trait]
impl InteractionHandle for SerenityInteraction {
    fn kind(&self) -> InteractionKind {
        InteractionKind::Command
    }

    fn command_name(&self) -> &str {
        &self.command.data.name
    }

    fn user(&self) -> &UserRef {
        &self.user
    }

    fn guild(&self) -> Option<&GuildRef> {
        self.guild.as_ref()
    }

    fn channel(&self) -> &ChannelRef {
        &self.channel
    }

    fn option(&self, name: &str) -> Option<&OptionValue> {
        self.options.get(name)
    }

    async fn respond(&self, message: &OutgoingMessage) -> Result<(), PlatformError> {
        let response = CreateInteractionResponse::Message(DiscordEmbeds::response(message));
        self.command.create_response(&self.http, response).await.map_err(platform_error)
    }

    async fn defer(&self, ephemeral: bool) -> Result<(), PlatformError> {
        let response = CreateInteractionResponse::Defer(
            CreateInteractionResponseMessage::new().ephemeral(ephemeral),
        );
        self.command.create_response(&self.http, response).await.map_err(platform_error)
    }

    async fn edit_response(&self, message: &OutgoingMessage) -> Result<(), PlatformError> {
        self.command
            .edit_response(&self.http, DiscordEmbeds::edit(message))
            .await
            .map(|_| ())
            .map_err(platform_error)
    }

    async fn follow_up(&self, message: &OutgoingMessage) -> Result<(), PlatformError> {
        self.command
            .create_followup(&self.http, DiscordEmbeds::follow_up(message))
            .await
            .map(|_| ())
            .map_err(platform_error)
    }

    async fn update_message(&self, message: &OutgoingMessage) -> Result<(), PlatformError> {
        let response = CreateInteractionResponse::UpdateMessage(DiscordEmbeds::response(message));
        self.command.create_response(&self.http, response).await.map_err(platform_error)
    }
}

// ---------------------------------------------------------------------------
// Log channel directory
// ---------------------------------------------------------------------------

pub struct SerenityLogDirectory {
    handles: Arc<DiscordHandles>,
}

#[async_trait]
impl LogChannelDirectory for SerenityLogDirectory {
    async fn find_text_channel(&self, guild_id: u64, name: &str) -> Result<Option<u64>, PlatformError> {
        let http = self.handles.http_or_not_ready()?;
        let channels = GuildId::new(guild_id).channels(http).await.map_err(platform_error)?;
        Ok(channels
            .values()
            .find(|ch| ch.kind == ChannelType::Text && ch.name == name)
            .map(|ch| ch.id.get()))
    }

    async fn can_manage_channels(&self, guild_id: u64) -> bool {
        let Some(cache) = self.handles.cache() else { return false };
        let me = cache.current_user().id;
        let Some(guild) = cache.guild(GuildId::new(guild_id)) else { return false };
        guild
            .members
            .get(&me)
            .is_some_and(|member| guild.member_permissions(member).manage_channels())
    }

    async fn create_text_channel(
        &self,
        guild_id: u64,
        name: &str,
        topic: &str,
    ) -> Result<u64, PlatformError> {
        let http = self.handles.http_or_not_ready()?;
        let builder = CreateChannel::new(name)
            .kind(ChannelType::Text)
            .topic(topic)
            .audit_log_reason("Automatic log channel");
        let channel = GuildId::new(guild_id)
            .create_channel(http, builder)
            .await
            .map_err(platform_error)?;
        Ok(channel.id.get())
    }

    async fn send_embed(&self, channel_id: u64, embed: &Embed) -> Result<(), PlatformError> {
        let http = self.handles.http_or_not_ready()?;
        ChannelId::new(channel_id)
            .send_message(http, DiscordEmbeds::channel_message(embed))
            .await
            .map(|_| ())
            .map_err(platform_error)
    }
}
