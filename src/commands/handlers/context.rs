use crate::commands::{CommandContext, HandlerResult};
use crate::core::confirm::ConfirmationOutcome;
use tracing::info;

pub(crate) async fn handle_reset(cx: &CommandContext<'_>) -> HandlerResult {
    cx.with_session(|session| session.reset()).await;
    cx.reply("Conversation context reset.").await
}

pub(crate) async fn handle_save_context(cx: &CommandContext<'_>) -> HandlerResult {
    let name = cx.args;
    if name.is_empty() {
        return cx.usage().await;
    }

    let exists = match cx.relay.contexts.exists(name) {
        Ok(exists) => exists,
        Err(err) => return cx.reply(format!("Error saving context: {err}")).await,
    };

    if exists {
        // Register before prompting so a quick "yes" cannot slip past.
        let pending = cx
            .relay
            .confirmations
            .register(cx.event.channel_id, cx.event.author.id);
        let timeout = cx.config.confirmation_timeout;
        cx.reply(format!(
            "Context '{name}' already exists. Type 'yes' to overwrite within {} seconds.",
            timeout.as_secs()
        ))
        .await?;

        match pending.wait(timeout).await {
            ConfirmationOutcome::Confirmed => {}
            ConfirmationOutcome::Declined => return cx.reply("Save canceled.").await,
            ConfirmationOutcome::TimedOut => {
                return cx.reply("Save canceled due to timeout.").await
            }
        }
    }

    let snapshot = cx.with_session(|session| session.to_snapshot()).await;
    match cx.relay.contexts.save(name, &snapshot) {
        Ok(()) => {
            info!(
                name,
                channel = %cx.event.channel_id,
                turns = snapshot.conversation.len(),
                overwrite = exists,
                "context saved"
            );
            cx.reply(format!("Context saved as '{name}'.")).await
        }
        Err(err) => cx.reply(format!("Error saving context: {err}")).await,
    }
}

pub(crate) async fn handle_load_context(cx: &CommandContext<'_>) -> HandlerResult {
    let name = cx.args;
    if name.is_empty() {
        return cx.usage().await;
    }

    let snapshot = match cx.relay.contexts.load(name) {
        Ok(Some(snapshot)) => snapshot,
        Ok(None) => return cx.reply(format!("Context '{name}' not found.")).await,
        Err(err) => return cx.reply(format!("Error loading context: {err}")).await,
    };

    if snapshot.channel_id != cx.event.channel_id {
        cx.reply(
            "Warning: This context was saved in a different channel. Proceeding to load anyway.",
        )
        .await?;
    }

    cx.with_session(|session| session.restore(snapshot)).await;
    cx.reply(format!("Context loaded from '{name}'.")).await
}
