use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Command options
// ---------------------------------------------------------------------------

/// Value type of a slash-command option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionKind {
    #[default]
    String,
    Integer,
    Number,
    Boolean,
    User,
    Channel,
    Role,
    Mentionable,
    Attachment,
}

impl OptionKind {
    /// Numeric option type used by the Discord application-command API.
    pub fn wire_type(self) -> u8 {
        match self {
            OptionKind::String => 3,
            OptionKind::Integer => 4,
            OptionKind::Boolean => 5,
            OptionKind::User => 6,
            OptionKind::Channel => 7,
            OptionKind::Role => 8,
            OptionKind::Mentionable => 9,
            OptionKind::Number => 10,
            OptionKind::Attachment => 11,
        }
    }
}

/// A fixed choice offered for an option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionChoice {
    pub name: String,
    pub value: serde_json::Value,
}

/// Declared parameter of a command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionSpec {
    pub name: String,
    pub description: String,
    #[serde(rename = "type", default)]
    pub kind: OptionKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<OptionChoice>,
}

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

/// One entry of the bulk "set all application commands" payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireCommand {
    pub name: String,
    pub description: String,
    pub options: Vec<WireOption>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireOption {
    #[serde(rename = "type")]
    pub kind: u8,
    pub name: String,
    pub description: String,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<OptionChoice>,
}

impl From<&OptionSpec> for WireOption {
    fn from(spec: &OptionSpec) -> Self {
        Self {
            kind: spec.kind.wire_type(),
            name: spec.name.clone(),
            description: spec.description.clone(),
            required: spec.required,
            choices: spec.choices.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Inbound interaction data
// ---------------------------------------------------------------------------

/// Kind of inbound interaction delivered by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionKind {
    /// A slash-command invocation.
    Command,
    /// Button / select-menu press.
    Component,
    Autocomplete,
    Modal,
    Other,
}

/// Resolved value of an option supplied by the invoking user.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    String(String),
    Integer(i64),
    Number(f64),
    Boolean(bool),
    User(u64),
    Channel(u64),
    Role(u64),
    Mentionable(u64),
    Attachment(u64),
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::String(s) => f.write_str(s),
            OptionValue::Integer(i) => write!(f, "{i}"),
            OptionValue::Number(n) => write!(f, "{n}"),
            OptionValue::Boolean(b) => write!(f, "{b}"),
            OptionValue::User(id) | OptionValue::Mentionable(id) => write!(f, "<@{id}>"),
            OptionValue::Channel(id) => write!(f, "<#{id}>"),
            OptionValue::Role(id) => write!(f, "<@&{id}>"),
            OptionValue::Attachment(id) => write!(f, "{id}"),
        }
    }
}

/// The user who invoked an interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: u64,
    /// Display tag (`name` or legacy `name#1234`).
    pub tag: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildRef {
    pub id: u64,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRef {
    pub id: u64,
}
