//! Discord Embed Builder
//!
//! Maps platform-neutral messages and embeds onto serenity's request builders.

use serenity::all::{
    CreateAllowedMentions, CreateEmbed, CreateEmbedFooter, CreateInteractionResponseFollowup,
    CreateInteractionResponseMessage, CreateMessage, EditInteractionResponse, Timestamp,
};
use slashforge_core::{Embed, OutgoingMessage, value_text};

pub struct DiscordEmbeds;

impl DiscordEmbeds {
    pub fn build_embed(embed: &Embed) -> CreateEmbed {
        let mut out = CreateEmbed::new();
        if let Some(title) = &embed.title {
            out = out.title(title);
        }
        if let Some(description) = &embed.description {
            out = out.description(description);
        }
        if let Some(color) = embed.color {
            out = out.color(color);
        }
        for field in &embed.fields {
            out = out.field(value_text(&field.name), value_text(&field.value), field.inline);
        }
        if let Some(footer) = &embed.footer {
            out = out.footer(CreateEmbedFooter::new(footer));
        }
        if embed.timestamp {
            out = out.timestamp(Timestamp::now());
        }
        out
    }

    /// Replies may echo user input, so only user mentions ping.
    /// `@everyone`, `@here` and role mentions render as plain text.
    pub fn allowed_mentions() -> CreateAllowedMentions {
        CreateAllowedMentions::new().all_users(true).all_roles(false).everyone(false)
    }

    fn embeds(message: &OutgoingMessage) -> Vec<CreateEmbed> {
        message.embeds.iter().map(Self::build_embed).collect()
    }

    /// Initial response (also used for component message updates).
    pub fn response(message: &OutgoingMessage) -> CreateInteractionResponseMessage {
        let mut out = CreateInteractionResponseMessage::new()
            .embeds(Self::embeds(message))
            .allowed_mentions(Self::allowed_mentions())
            .ephemeral(message.ephemeral);
        if let Some(content) = &message.content {
            out = out.content(content);
        }
        out
    }

    pub fn edit(message: &OutgoingMessage) -> EditInteractionResponse {
        let mut out = EditInteractionResponse::new()
            .embeds(Self::embeds(message))
            .allowed_mentions(Self::allowed_mentions());
        if let Some(content) = &message.content {
            out = out.content(content);
        }
        out
    }

    pub fn follow_up(message: &OutgoingMessage) -> CreateInteractionResponseFollowup {
        let mut out = CreateInteractionResponseFollowup::new()
            .embeds(Self::embeds(message))
            .allowed_mentions(Self::allowed_mentions())
            .ephemeral(message.ephemeral);
        if let Some(content) = &message.content {
            out = out.content(content);
        }
        out
    }

    pub fn channel_message(embed: &Embed) -> CreateMessage {
        CreateMessage::new()
            .embed(Self::build_embed(embed))
            .allowed_mentions(Self::allowed_mentions())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[test]
    fn embed_fields_are_stringified() {
        let embed = Embed::new()
            .title("Stats")
            .description("Server numbers")
            .field("Members", 12, true)
            .footer("bot");

        let json = serde_json::to_value(DiscordEmbeds::build_embed(&embed)).unwrap();

        assert_eq!(json["title"], "Stats");
        assert_eq!(json["description"], "Server numbers");
        assert_eq!(json["fields"][0]["name"], "Members");
        assert_eq!(json["fields"][0]["value"], "12");
        assert_eq!(json["fields"][0]["inline"], true);
        assert_eq!(json["footer"]["text"], "bot");
    }

    #[test]
    fn ephemeral_response_sets_the_flag() {
        let json =
            serde_json::to_value(DiscordEmbeds::response(&OutgoingMessage::ephemeral("secret")))
                .unwrap();
        assert_eq!(json["content"], "secret");
        assert_eq!(json["flags"], 64);
    }

    fn parse_list(payload: &Value) -> &Value {
        &payload["allowed_mentions"]["parse"]
    }

    #[test]
    fn echoed_text_cannot_mass_ping() {
        let message = OutgoingMessage::text("@everyone hi <@&123>");

        let response = serde_json::to_value(DiscordEmbeds::response(&message)).unwrap();
        let edit = serde_json::to_value(DiscordEmbeds::edit(&message)).unwrap();
        let follow_up = serde_json::to_value(DiscordEmbeds::follow_up(&message)).unwrap();

        for payload in [&response, &edit, &follow_up] {
            assert_eq!(payload["content"], "@everyone hi <@&123>");
            assert_eq!(parse_list(payload), &json!(["users"]));
        }
    }
}
