use crate::api::CompletionBackend;
use crate::commands::{self, CommandResult};
use crate::core::chat::run_chat_turn;
use crate::core::config::{ConfigHandle, DataPaths};
use crate::core::confirm::ConfirmationBroker;
use crate::core::session::SessionStore;
use crate::storage::{CharacterStore, ContextStore};
use crate::transport::{ChatTransport, InboundEvent, Outbox};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Everything one inbound message needs: configuration, live sessions,
/// durable stores and the two external collaborators.
pub struct Relay {
    pub config: ConfigHandle,
    pub sessions: SessionStore,
    pub characters: CharacterStore,
    pub contexts: ContextStore,
    pub confirmations: ConfirmationBroker,
    pub backend: Arc<dyn CompletionBackend>,
    pub transport: Arc<dyn ChatTransport>,
}

impl Relay {
    pub fn new(
        config: ConfigHandle,
        paths: &DataPaths,
        backend: Arc<dyn CompletionBackend>,
        transport: Arc<dyn ChatTransport>,
    ) -> Self {
        Self {
            config,
            sessions: SessionStore::new(),
            characters: CharacterStore::new(paths.characters_file()),
            contexts: ContextStore::new(paths.contexts_dir()),
            confirmations: ConfirmationBroker::new(),
            backend,
            transport,
        }
    }

    /// Whether an event is addressed to the bot at all.
    pub fn accepts(&self, event: &InboundEvent) -> bool {
        if event.author.is_self {
            return false;
        }
        let target = self.config.snapshot().target_channel;
        if event.channel_id != target {
            debug!(channel = %event.channel_id, %target, "ignoring message outside target channel");
            return false;
        }
        true
    }

    /// Processes one event to completion: a command or a chat turn.
    ///
    /// Failures are reported in the channel or logged; nothing propagates.
    pub async fn handle_event(&self, event: InboundEvent) {
        let config = self.config.snapshot();
        let outbox = Outbox::new(
            Arc::clone(&self.transport),
            event.channel_id,
            config.max_message_length,
        );
        self.sessions
            .get_or_create(event.channel_id, &config.default_model);

        let result = match commands::process_input(config.command_prefix, &event.content) {
            CommandResult::Run(invocation) => {
                info!(
                    command = invocation.command.name,
                    message = event.message_id,
                    channel = %event.channel_id,
                    author = %event.author.id,
                    "running command"
                );
                let cx = commands::CommandContext {
                    command: invocation.command,
                    relay: self,
                    config: &config,
                    event: &event,
                    outbox: &outbox,
                    args: invocation.args,
                };
                commands::execute(&cx).await
            }
            CommandResult::ProcessAsMessage => {
                run_chat_turn(self, &config, &event, &outbox).await
            }
        };

        if let Err(err) = result {
            warn!(
                channel = %event.channel_id,
                message = event.message_id,
                error = %err,
                "failed to deliver reply"
            );
        }
    }
}
