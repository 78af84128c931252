//! Turning an ordinary channel message into a transcript entry and a reply.

use crate::api::CompletionRequest;
use crate::core::config::RuntimeConfig;
use crate::core::message::ConversationTurn;
use crate::core::policy::{complete_with_retry, ReplyOutcome};
use crate::core::relay::Relay;
use crate::transport::{Author, InboundEvent, Outbox, TransportError};
use tracing::{debug, warn};

const IMAGE_EXTENSIONS: &[&str] = &[".png", ".jpg", ".jpeg", ".gif", ".bmp", ".webp"];
const IMAGE_MARKER: &str = "[User attached an image]";
const EMPTY_REPLY_NOTICE: &str = "Received empty response from API.";

/// `name (alias) [ID: id]`, or `name [ID: id]` without an alias.
pub fn user_identity(author: &Author) -> String {
    match author.alias.as_deref().filter(|alias| !alias.is_empty()) {
        Some(alias) => format!("{} ({}) [ID: {}]", author.display_name, alias, author.id),
        None => format!("{} [ID: {}]", author.display_name, author.id),
    }
}

pub fn is_image_filename(filename: &str) -> bool {
    let lower = filename.to_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Builds the user turn text: identity, optional reply quote, the message,
/// and a marker when an image was attached.
pub fn compose_user_message(event: &InboundEvent) -> String {
    let mut content = event.content.trim().to_string();

    if event
        .attachments
        .iter()
        .any(|attachment| is_image_filename(&attachment.filename))
    {
        content.push('\n');
        content.push_str(IMAGE_MARKER);
    }

    if let Some(reply) = &event.reply_to {
        content = format!(
            "(in reply to {}: {})\n{}",
            reply.author_name,
            reply.content.trim(),
            content
        );
    }

    format!("{}: {}", user_identity(&event.author), content)
}

/// Notice shown before retrying a `500`: the active character's override if
/// it has one, otherwise the configured default.
fn retry_notice(relay: &Relay, config: &RuntimeConfig, character: Option<&str>) -> String {
    let Some(name) = character else {
        return config.error_500_message.clone();
    };
    match relay.characters.get(name) {
        Ok(Some(character)) => character
            .error_override
            .unwrap_or_else(|| config.error_500_message.clone()),
        Ok(None) => config.error_500_message.clone(),
        Err(err) => {
            warn!(character = name, error = %err, "could not read character for retry notice");
            config.error_500_message.clone()
        }
    }
}

/// Appends the user's message, asks the model, and relays the outcome.
pub async fn run_chat_turn(
    relay: &Relay,
    config: &RuntimeConfig,
    event: &InboundEvent,
    outbox: &Outbox,
) -> Result<(), TransportError> {
    let user_message = compose_user_message(event);
    let (transcript, model, character) = relay
        .sessions
        .with_session(event.channel_id, &config.default_model, |session| {
            session.append(ConversationTurn::user(user_message));
            (
                session.transcript().to_vec(),
                session.active_model.clone(),
                session.active_character.clone(),
            )
        })
        .await;

    debug!(
        channel = %event.channel_id,
        %model,
        turns = transcript.len(),
        "requesting completion"
    );

    let request = CompletionRequest {
        endpoint: config.endpoint_url.clone(),
        model,
        transcript,
        timeout: config.api_timeout,
    };
    let notice = retry_notice(relay, config, character.as_deref());
    let outcome = complete_with_retry(
        relay.backend.as_ref(),
        &request,
        outbox,
        &notice,
        config.retry_delay,
    )
    .await;

    match outcome {
        ReplyOutcome::Reply(text) => {
            relay
                .sessions
                .with_session(event.channel_id, &config.default_model, |session| {
                    session.append(ConversationTurn::assistant(text.clone()))
                })
                .await;
            outbox.say(&text).await
        }
        ReplyOutcome::Empty => outbox.say(EMPTY_REPLY_NOTICE).await,
        ReplyOutcome::Failed(message) => outbox.say(&message).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{Attachment, ReplyReference, UserId};
    use crate::utils::test_utils::event_from;

    #[test]
    fn identity_includes_alias_when_present() {
        let mut event = event_from(1, 42, "alice", "hi");
        assert_eq!(user_identity(&event.author), "alice [ID: 42]");

        event.author.alias = Some("Ali".to_string());
        assert_eq!(user_identity(&event.author), "alice (Ali) [ID: 42]");

        event.author.alias = Some(String::new());
        assert_eq!(user_identity(&event.author), "alice [ID: 42]");
    }

    #[test]
    fn image_extensions_match_case_insensitively() {
        for name in ["cat.PNG", "a.jpg", "b.JpEg", "c.gif", "d.bmp", "e.webp"] {
            assert!(is_image_filename(name), "{name}");
        }
        for name in ["notes.txt", "png", "archive.png.zip"] {
            assert!(!is_image_filename(name), "{name}");
        }
    }

    #[test]
    fn plain_message_is_prefixed_with_identity() {
        let event = event_from(1, 42, "alice", "  hello there  ");
        assert_eq!(compose_user_message(&event), "alice [ID: 42]: hello there");
    }

    #[test]
    fn image_marker_is_appended_once() {
        let mut event = event_from(1, 42, "alice", "look");
        event.attachments = vec![
            Attachment {
                filename: "one.png".to_string(),
            },
            Attachment {
                filename: "two.JPG".to_string(),
            },
        ];
        assert_eq!(
            compose_user_message(&event),
            "alice [ID: 42]: look\n[User attached an image]"
        );
    }

    #[test]
    fn non_image_attachments_add_nothing() {
        let mut event = event_from(1, 42, "alice", "doc");
        event.attachments = vec![Attachment {
            filename: "report.pdf".to_string(),
        }];
        assert_eq!(compose_user_message(&event), "alice [ID: 42]: doc");
    }

    #[test]
    fn replies_quote_the_original_before_the_content() {
        let mut event = event_from(1, 42, "alice", "agreed");
        event.author.id = UserId(42);
        event.reply_to = Some(ReplyReference {
            author_name: "bob".to_string(),
            content: " pizza tonight? ".to_string(),
        });
        assert_eq!(
            compose_user_message(&event),
            "alice [ID: 42]: (in reply to bob: pizza tonight?)\nagreed"
        );
    }

    #[test]
    fn reply_quote_precedes_content_and_image_marker() {
        let mut event = event_from(1, 42, "alice", "this one");
        event.attachments.push(Attachment {
            filename: "boat.png".to_string(),
        });
        event.reply_to = Some(ReplyReference {
            author_name: "bob".to_string(),
            content: "which ship?".to_string(),
        });
        assert_eq!(
            compose_user_message(&event),
            "alice [ID: 42]: (in reply to bob: which ship?)\nthis one\n[User attached an image]"
        );
    }
}
