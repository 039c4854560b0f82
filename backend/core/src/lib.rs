//! Shared data model and platform boundary for slashforge.

pub mod error;
pub mod message;
pub mod traits;
pub mod types;

pub use error::{DefinitionError, ModuleError, PlatformError, MAX_DESCRIPTION_LEN, MAX_NAME_LEN};
pub use message::{value_text, Embed, EmbedField, OutgoingMessage};
pub use traits::{
    CommandAuditSink, CommandPublisher, InteractionHandle, InteractionSink, LogChannelDirectory,
};
pub use types::{
    ChannelRef, GuildRef, InteractionKind, OptionChoice, OptionKind, OptionSpec, OptionValue,
    UserRef, WireCommand, WireOption,
};
