use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A message sent back to the platform in response to an interaction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
    /// Only visible to the invoking user.
    #[serde(default)]
    pub ephemeral: bool,
}

impl OutgoingMessage {
    pub fn text(content: impl Into<String>) -> Self {
        Self { content: Some(content.into()), ..Default::default() }
    }

    pub fn ephemeral(content: impl Into<String>) -> Self {
        Self { content: Some(content.into()), embeds: Vec::new(), ephemeral: true }
    }

    pub fn with_embed(mut self, embed: Embed) -> Self {
        self.embeds.push(embed);
        self
    }

    /// Coerce every embed field name/value to text.
    ///
    /// The platform rejects non-string field values, while module files
    /// happily contain `value = 42`.
    pub fn normalized(mut self) -> Self {
        for embed in &mut self.embeds {
            for field in &mut embed.fields {
                field.name = Value::String(value_text(&field.name));
                field.value = Value::String(value_text(&field.value));
            }
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.content.as_deref().is_none_or(str::is_empty) && self.embeds.is_empty()
    }
}

impl From<&str> for OutgoingMessage {
    fn from(content: &str) -> Self {
        Self::text(content)
    }
}

impl From<String> for OutgoingMessage {
    fn from(content: String) -> Self {
        Self::text(content)
    }
}

impl From<Embed> for OutgoingMessage {
    fn from(embed: Embed) -> Self {
        Self::default().with_embed(embed)
    }
}

/// Rich embed block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Embed {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<String>,
    /// Stamp the embed with the send time.
    #[serde(default)]
    pub timestamp: bool,
}

impl Embed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn color(mut self, color: u32) -> Self {
        self.color = Some(color);
        self
    }

    pub fn footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    pub fn field(mut self, name: impl Into<Value>, value: impl Into<Value>, inline: bool) -> Self {
        self.fields.push(EmbedField { name: name.into(), value: value.into(), inline });
        self
    }
}

/// Embed field. Name and value accept any JSON scalar until normalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: Value,
    pub value: Value,
    #[serde(default)]
    pub inline: bool,
}

/// Text form of a field value: strings as-is, everything else as JSON.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_turns_field_values_into_strings() {
        let msg = OutgoingMessage::from(
            Embed::new()
                .title("Stats")
                .field("Servers", 12, true)
                .field(7, true, false)
                .field("Missing", Value::Null, false),
        )
        .normalized();

        let fields = &msg.embeds[0].fields;
        assert_eq!(fields[0].value, Value::String("12".into()));
        assert_eq!(fields[1].name, Value::String("7".into()));
        assert_eq!(fields[1].value, Value::String("true".into()));
        assert_eq!(fields[2].value, Value::String("null".into()));
        assert!(fields[0].inline);
    }

    #[test]
    fn text_messages_are_not_empty() {
        assert!(!OutgoingMessage::from("hi").is_empty());
        assert!(OutgoingMessage::default().is_empty());
        assert!(OutgoingMessage::text("").is_empty());
    }
}
