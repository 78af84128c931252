//! Channel commands: parsing the first token of a message and running the
//! matching handler.
//!
//! A message is a command only when it starts with the configured prefix and
//! its first word names a registered command (case-insensitive). Everything
//! else is ordinary chat.

mod handlers;
mod registry;

pub use registry::{all_commands, find_command, Command, CommandInvocation, CommandKind};

use crate::core::config::RuntimeConfig;
use crate::core::relay::Relay;
use crate::core::session::ChannelSession;
use crate::transport::{InboundEvent, Outbox, TransportError};

pub enum CommandResult<'a> {
    Run(CommandInvocation<'a>),
    ProcessAsMessage,
}

pub fn process_input(prefix: char, input: &str) -> CommandResult<'_> {
    let trimmed = input.trim();

    let Some(rest) = trimmed.strip_prefix(prefix) else {
        return CommandResult::ProcessAsMessage;
    };

    let (command_name, args) = split_first_word(rest);
    if command_name.is_empty() || rest.starts_with(char::is_whitespace) {
        return CommandResult::ProcessAsMessage;
    }

    match registry::find_command(command_name) {
        Some(command) => CommandResult::Run(CommandInvocation { command, args }),
        None => CommandResult::ProcessAsMessage,
    }
}

/// Splits off the first whitespace-delimited word; the remainder is trimmed.
pub(crate) fn split_first_word(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    match text.find(char::is_whitespace) {
        Some(index) => (&text[..index], text[index..].trim()),
        None => (text, ""),
    }
}

/// What a handler gets to work with for one command.
pub struct CommandContext<'a> {
    pub command: &'static Command,
    pub relay: &'a Relay,
    /// Snapshot taken when the message arrived; a reload mid-command does not
    /// change it.
    pub config: &'a RuntimeConfig,
    pub event: &'a InboundEvent,
    pub outbox: &'a Outbox,
    pub args: &'a str,
}

pub(crate) type HandlerResult = Result<(), TransportError>;

impl CommandContext<'_> {
    pub(crate) async fn reply(&self, text: impl AsRef<str>) -> HandlerResult {
        self.outbox.say(text).await
    }

    pub(crate) async fn usage(&self) -> HandlerResult {
        self.reply(self.command.usage(self.config.command_prefix))
            .await
    }

    pub(crate) fn prefix(&self) -> char {
        self.config.command_prefix
    }

    /// Runs `mutate` on this channel's session with its lock held.
    pub(crate) async fn with_session<F, T>(&self, mutate: F) -> T
    where
        F: FnOnce(&mut ChannelSession) -> T,
    {
        self.relay
            .sessions
            .with_session(self.event.channel_id, &self.config.default_model, mutate)
            .await
    }
}

pub async fn execute(cx: &CommandContext<'_>) -> HandlerResult {
    match cx.command.kind {
        CommandKind::Help => handlers::core::handle_help(cx).await,
        CommandKind::ReloadConfig => handlers::config::handle_reload_config(cx).await,
        CommandKind::ListModels => handlers::config::handle_list_models(cx).await,
        CommandKind::SetModel => handlers::config::handle_set_model(cx).await,
        CommandKind::Reset => handlers::context::handle_reset(cx).await,
        CommandKind::SaveContext => handlers::context::handle_save_context(cx).await,
        CommandKind::LoadContext => handlers::context::handle_load_context(cx).await,
        CommandKind::NewCharacter => handlers::character::handle_new_character(cx).await,
        CommandKind::DeleteCharacter => handlers::character::handle_delete_character(cx).await,
        CommandKind::LoadCharacter => handlers::character::handle_load_character(cx).await,
        CommandKind::ListCharacters => handlers::character::handle_list_characters(cx).await,
    }
}
