//! Retry and delivery rules around a completion call.
//!
//! The upstream API signals a transient overload by answering with the bare
//! text `500`. That reply is never recorded; instead the channel gets a short
//! notice, the bot waits `retry_delay`, and the identical request is sent one
//! more time. Whatever the second attempt produces is final.

use crate::api::{CompletionBackend, CompletionError, CompletionRequest};
use crate::transport::Outbox;
use std::time::Duration;
use tracing::{info, warn};

pub const TRANSIENT_FAILURE_SENTINEL: &str = "500";

pub fn is_transient_failure(reply: &str) -> bool {
    reply.trim() == TRANSIENT_FAILURE_SENTINEL
}

/// Splits `text` into consecutive pieces of at most `limit` characters.
///
/// Concatenating the pieces gives back `text`; code points are never split.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut count = 0;
    for ch in text.chars() {
        if count == limit {
            chunks.push(std::mem::take(&mut current));
            count = 0;
        }
        current.push(ch);
        count += 1;
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Final result of a chat turn's completion, after at most one retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyOutcome {
    /// Text to record as the assistant turn and send.
    Reply(String),
    /// The API answered with nothing usable.
    Empty,
    /// The request failed; the text is the user-facing explanation.
    Failed(String),
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Attempt {
    First,
    Retry,
}

fn describe_failure(err: &CompletionError, attempt: Attempt) -> String {
    match (err.is_timeout(), attempt) {
        (true, Attempt::First) => "The API is taking too long to respond.".to_string(),
        (true, Attempt::Retry) => "The API is taking too long to respond (on retry).".to_string(),
        (false, Attempt::First) => format!("An error occurred: {err}"),
        (false, Attempt::Retry) => format!("An error occurred on retry: {err}"),
    }
}

async fn attempt(
    backend: &dyn CompletionBackend,
    request: &CompletionRequest,
    outbox: &Outbox,
) -> Result<String, CompletionError> {
    outbox.typing().await;
    match tokio::time::timeout(request.timeout, backend.complete(request)).await {
        Ok(result) => result,
        Err(_) => Err(CompletionError::Timeout(request.timeout)),
    }
}

fn settle(result: Result<String, CompletionError>, which: Attempt) -> ReplyOutcome {
    match result {
        Ok(text) if text.is_empty() => ReplyOutcome::Empty,
        Ok(text) => ReplyOutcome::Reply(text),
        Err(err) => {
            warn!(error = %err, retry = (which == Attempt::Retry), "completion request failed");
            ReplyOutcome::Failed(describe_failure(&err, which))
        }
    }
}

/// Runs the completion with the single-retry rule for the `500` sentinel.
///
/// `notice` is sent to the channel before waiting `retry_delay`. A failure to
/// deliver it does not stop the retry.
pub async fn complete_with_retry(
    backend: &dyn CompletionBackend,
    request: &CompletionRequest,
    outbox: &Outbox,
    notice: &str,
    retry_delay: Duration,
) -> ReplyOutcome {
    let first = attempt(backend, request, outbox).await;
    match first {
        Ok(ref text) if is_transient_failure(text) => {
            info!(
                channel = %outbox.channel(),
                model = %request.model,
                delay_secs = retry_delay.as_secs(),
                "upstream answered 500; retrying once"
            );
            if let Err(err) = outbox.say(notice).await {
                warn!(error = %err, "failed to send retry notice");
            }
            tokio::time::sleep(retry_delay).await;
            settle(attempt(backend, request, outbox).await, Attempt::Retry)
        }
        other => settle(other, Attempt::First),
    }
}
