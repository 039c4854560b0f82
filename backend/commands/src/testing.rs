//! In-memory interaction used by unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use slashforge_core::{
    ChannelRef, GuildRef, InteractionHandle, InteractionKind, OptionValue, OutgoingMessage,
    PlatformError, UserRef,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Respond(OutgoingMessage),
    Defer(bool),
    Edit(OutgoingMessage),
    FollowUp(OutgoingMessage),
    Update(OutgoingMessage),
}

pub struct FakeInteraction {
    kind: InteractionKind,
    name: String,
    user: UserRef,
    guild: Option<GuildRef>,
    channel: ChannelRef,
    options: HashMap<String, OptionValue>,
    calls: Mutex<Vec<Call>>,
    fail_respond: AtomicBool,
    expire_defer: AtomicBool,
    fail_everything: AtomicBool,
}

impl FakeInteraction {
    pub fn command(name: &str) -> Self {
        Self {
            kind: InteractionKind::Command,
            name: name.to_string(),
            user: UserRef { id: 1001, tag: "tester".into() },
            guild: Some(GuildRef { id: 42, name: Some("Test Guild".into()) }),
            channel: ChannelRef { id: 7 },
            options: HashMap::new(),
            calls: Mutex::new(Vec::new()),
            fail_respond: AtomicBool::new(false),
            expire_defer: AtomicBool::new(false),
            fail_everything: AtomicBool::new(false),
        }
    }

    pub fn with_kind(mut self, kind: InteractionKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_option(mut self, name: &str, value: OptionValue) -> Self {
        self.options.insert(name.to_string(), value);
        self
    }

    pub fn without_guild(mut self) -> Self {
        self.guild = None;
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn fail_respond(&self) {
        self.fail_respond.store(true, Ordering::SeqCst);
    }

    pub fn expire_defer(&self) {
        self.expire_defer.store(true, Ordering::SeqCst);
    }

    pub fn fail_everything(&self) {
        self.fail_everything.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) -> Result<(), PlatformError> {
        self.calls.lock().unwrap().push(call);
        if self.fail_everything.load(Ordering::SeqCst) {
            return Err(PlatformError::Request("boom".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl InteractionHandle for FakeInteraction {
    fn kind(&self) -> InteractionKind {
        self.kind
    }

    fn command_name(&self) -> &str {
        &self.name
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
        self.record(Call::Respond(message.clone()))?;
        if self.fail_respond.load(Ordering::SeqCst) {
            return Err(PlatformError::Request("respond rejected".into()));
        }
        Ok(())
    }

    async fn defer(&self, ephemeral: bool) -> Result<(), PlatformError> {
        self.record(Call::Defer(ephemeral))?;
        if self.expire_defer.load(Ordering::SeqCst) {
            return Err(PlatformError::InteractionExpired);
        }
        Ok(())
    }

    async fn edit_response(&self, message: &OutgoingMessage) -> Result<(), PlatformError> {
        self.record(Call::Edit(message.clone()))
    }

    async fn follow_up(&self, message: &OutgoingMessage) -> Result<(), PlatformError> {
        self.record(Call::FollowUp(message.clone()))
    }

    async fn update_message(&self, message: &OutgoingMessage) -> Result<(), PlatformError> {
        self.record(Call::Update(message.clone()))
    }
}
