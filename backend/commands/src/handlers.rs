//! Command handlers: the named built-ins module files can reference, and the
//! templated static reply used by `reply = ...` entries.
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};
use std::time::Instant;

use anyhow::Result;
use async_trait::async_trait;
use regex::{Captures, Regex};
use serde_json::Value;
use slashforge_core::{Embed, OutgoingMessage};

use crate::context::CommandContext;
use crate::dispatch::CommandHandler;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_-]*)\}").unwrap());

// ---------------------------------------------------------------------------
// Handler table
// ---------------------------------------------------------------------------

/// Handler ids that module files may reference with `handler = "<id>"`.
#[derive(Clone, Default)]
pub struct HandlerTable {
    handlers: HashMap<String, Arc<dyn CommandHandler>>,
}

impl HandlerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table pre-wired with `help`, `ping` and `echo`.
    pub fn with_builtins() -> Self {
        let mut table = Self::new();
        table.register("help", Arc::new(HelpHandler));
        table.register("ping", Arc::new(PingHandler));
        table.register("echo", Arc::new(EchoHandler));
        table
    }

    pub fn register(&mut self, id: impl Into<String>, handler: Arc<dyn CommandHandler>) {
        self.handlers.insert(id.into().to_lowercase(), handler);
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn CommandHandler>> {
        self.handlers.get(&id.to_lowercase()).cloned()
    }

    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.handlers.keys().cloned().collect();
        ids.sort();
        ids
    }
}

// ---------------------------------------------------------------------------
// /help
// ---------------------------------------------------------------------------

pub struct HelpHandler;

#[async_trait]
impl CommandHandler for HelpHandler {
    async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let mut commands = ctx.commands().to_vec();
        commands.sort_by(|a, b| a.name.cmp(&b.name));

        let lines: Vec<String> = commands
            .iter()
            .map(|cmd| format!("`/{}` — {}", cmd.name, cmd.description))
            .collect();
        let embed = Embed::new()
            .title("📖 Available Commands")
            .description(lines.join("\n"))
            .color(0x5865F2)
            .footer(format!("{} commands", commands.len()));

        ctx.reply(OutgoingMessage::from(embed)).await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// /ping
// ---------------------------------------------------------------------------

pub struct PingHandler;

#[async_trait]
impl CommandHandler for PingHandler {
    async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let started = Instant::now();
        ctx.reply("🏓 Pinging...").await?;
        let latency = started.elapsed().as_millis();
        ctx.edit(format!("🏓 Pong! **{latency}ms**")).await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// /echo
// ---------------------------------------------------------------------------

pub struct EchoHandler;

#[async_trait]
impl CommandHandler for EchoHandler {
    async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        match ctx.get_string("text").map(str::trim).filter(|t| !t.is_empty()) {
            Some(text) => ctx.reply(text.to_string()).await?,
            None => ctx.reply(OutgoingMessage::ephemeral("Nothing to echo.")).await?,
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Static reply
// ---------------------------------------------------------------------------

/// Replies with a fixed message, filling `{placeholder}`s from the request.
///
/// Known placeholders: `user`, `user_tag`, `channel`, `guild`, `command`.
/// Any other name is looked up as an option; unresolved ones are left as is.
pub struct ReplyHandler {
    template: OutgoingMessage,
}

impl ReplyHandler {
    pub fn new(template: OutgoingMessage) -> Self {
        Self { template }
    }

    pub fn render(&self, ctx: &CommandContext) -> OutgoingMessage {
        let mut message = self.template.clone();
        message.content = message.content.map(|c| render_text(&c, ctx));
        for embed in &mut message.embeds {
            embed.title = embed.title.take().map(|t| render_text(&t, ctx));
            embed.description = embed.description.take().map(|d| render_text(&d, ctx));
            embed.footer = embed.footer.take().map(|f| render_text(&f, ctx));
            for field in &mut embed.fields {
                render_value(&mut field.name, ctx);
                render_value(&mut field.value, ctx);
            }
        }
        message
    }
}

#[async_trait]
impl CommandHandler for ReplyHandler {
    async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        ctx.reply(self.render(ctx)).await?;
        Ok(())
    }
}

fn render_value(value: &mut Value, ctx: &CommandContext) {
    if let Value::String(s) = value {
        *s = render_text(s, ctx);
    }
}

fn render_text(text: &str, ctx: &CommandContext) -> String {
    PLACEHOLDER
        .replace_all(text, |caps: &Captures| {
            let key = &caps[1];
            match key {
                "user" => format!("<@{}>", ctx.user().id),
                "user_tag" => ctx.user().tag.clone(),
                "channel" => format!("<#{}>", ctx.channel().id),
                "guild" => ctx
                    .guild()
                    .and_then(|g| g.name.clone())
                    .unwrap_or_else(|| "Direct Messages".to_string()),
                "command" => ctx.command_name().to_string(),
                other => ctx
                    .option(other)
                    .map(ToString::to_string)
                    .unwrap_or_else(|| caps[0].to_string()),
            }
        })
        .into_owned()
}
