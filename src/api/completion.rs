//! Remote chat-completion calls and tolerant reply parsing.
//!
//! Upstream servers are not always well behaved: some return proper
//! OpenAI-style JSON, some return JSON followed by junk, and some return a
//! bare string such as `500`. [`parse_reply_body`] walks an explicit fallback
//! chain and tags what it found so callers can tell the cases apart.

use crate::api::ChatRequest;
use crate::core::message::ConversationTurn;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// End-of-turn markers some backends leak into the reply text.
const END_OF_TURN_SENTINELS: &[&str] = &["<|eot_id|>", "</s>"];

#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub endpoint: String,
    pub model: String,
    pub transcript: Vec<ConversationTurn>,
    pub timeout: Duration,
}

#[derive(Debug)]
pub enum CompletionError {
    /// Connection, TLS or body-read failure.
    Request(reqwest::Error),
    /// No answer within the configured API timeout.
    Timeout(Duration),
}

impl fmt::Display for CompletionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompletionError::Request(err) => write!(f, "{err}"),
            CompletionError::Timeout(after) => {
                write!(f, "no response after {} seconds", after.as_secs())
            }
        }
    }
}

impl std::error::Error for CompletionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CompletionError::Request(err) => Some(err),
            CompletionError::Timeout(_) => None,
        }
    }
}

impl CompletionError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, CompletionError::Timeout(_))
    }
}

/// What the reply body turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyBody {
    /// Structured data was found (possibly after trailing garbage was dropped).
    Parsed(String),
    /// Nothing structured; the body text as received.
    RawText(String),
}

impl ReplyBody {
    pub fn as_str(&self) -> &str {
        match self {
            ReplyBody::Parsed(text) | ReplyBody::RawText(text) => text,
        }
    }
}

fn content_from_value(value: Value) -> String {
    match value {
        Value::Object(_) => value
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        Value::String(text) => text,
        other => other.to_string(),
    }
}

/// Full JSON parse, then a parse of the leading JSON value only, then raw text.
pub fn parse_reply_body(body: &str) -> ReplyBody {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        return ReplyBody::Parsed(content_from_value(value));
    }

    match serde_json::Deserializer::from_str(body)
        .into_iter::<Value>()
        .next()
    {
        Some(Ok(value)) => ReplyBody::Parsed(content_from_value(value)),
        _ => ReplyBody::RawText(body.to_string()),
    }
}

/// Removes end-of-turn sentinels and surrounding whitespace.
pub fn normalize_reply(text: &str) -> String {
    let mut cleaned = text.trim().to_string();
    for sentinel in END_OF_TURN_SENTINELS {
        cleaned = cleaned.replace(sentinel, "");
    }
    cleaned.trim().to_string()
}

#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Sends the transcript and returns the normalized reply text.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError>;
}

/// [`CompletionBackend`] that POSTs to an OpenAI-compatible endpoint.
#[derive(Clone, Default)]
pub struct HttpCompletionClient {
    client: reqwest::Client,
}

impl HttpCompletionClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CompletionBackend for HttpCompletionClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let payload = ChatRequest::new(request.model.clone(), &request.transcript);
        let map_err = |err: reqwest::Error| {
            if err.is_timeout() {
                CompletionError::Timeout(request.timeout)
            } else {
                CompletionError::Request(err)
            }
        };

        let response = self
            .client
            .post(&request.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .timeout(request.timeout)
            .json(&payload)
            .send()
            .await
            .map_err(map_err)?;

        // Error statuses still carry a body worth reading; "500" arrives this way.
        let status = response.status();
        let body = response.text().await.map_err(map_err)?;
        let reply = parse_reply_body(&body);
        debug!(
            %status,
            model = %request.model,
            bytes = body.len(),
            structured = matches!(reply, ReplyBody::Parsed(_)),
            "completion response received"
        );

        Ok(normalize_reply(reply.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request(endpoint: String) -> CompletionRequest {
        CompletionRequest {
            endpoint,
            model: "gpt-x".to_string(),
            transcript: vec![
                ConversationTurn::system("You are Bob"),
                ConversationTurn::user("alice [ID: 1]: hi"),
            ],
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn openai_shaped_body_yields_message_content() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":" Hello! "}}]}"#;
        assert_eq!(
            parse_reply_body(body),
            ReplyBody::Parsed(" Hello! ".to_string())
        );
    }

    #[test]
    fn mapping_without_choices_yields_empty_string() {
        assert_eq!(
            parse_reply_body(r#"{"error":"overloaded"}"#),
            ReplyBody::Parsed(String::new())
        );
        assert_eq!(
            parse_reply_body(r#"{"choices":[]}"#),
            ReplyBody::Parsed(String::new())
        );
    }

    #[test]
    fn bare_number_becomes_its_text() {
        assert_eq!(parse_reply_body("500"), ReplyBody::Parsed("500".to_string()));
    }

    #[test]
    fn leading_json_is_decoded_when_trailing_garbage_follows() {
        let body = r#"{"choices":[{"message":{"content":"partial"}}]} trailing junk"#;
        assert_eq!(
            parse_reply_body(body),
            ReplyBody::Parsed("partial".to_string())
        );
    }

    #[test]
    fn non_json_falls_back_to_raw_text() {
        assert_eq!(
            parse_reply_body("upstream exploded"),
            ReplyBody::RawText("upstream exploded".to_string())
        );
        assert_eq!(parse_reply_body(""), ReplyBody::RawText(String::new()));
    }

    #[test]
    fn sentinels_and_whitespace_are_stripped() {
        assert_eq!(normalize_reply("  Hi there<|eot_id|>\n"), "Hi there");
        assert_eq!(normalize_reply("Done.</s>  "), "Done.");
        assert_eq!(normalize_reply("<|eot_id|>"), "");
    }

    #[tokio::test]
    async fn posts_transcript_and_returns_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("accept", "application/json"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-x",
                "temperature": 0.7,
                "messages": [
                    {"role": "system", "content": "You are Bob"},
                    {"role": "user", "content": "alice [ID: 1]: hi"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"choices":[{"message":{"content":"Hey Alice</s>"}}]}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpCompletionClient::default();
        let reply = client
            .complete(&request(format!("{}/v1/chat/completions", server.uri())))
            .await
            .expect("completion");
        assert_eq!(reply, "Hey Alice");
    }

    #[tokio::test]
    async fn error_status_body_is_still_returned() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("500"))
            .mount(&server)
            .await;

        let client = HttpCompletionClient::default();
        let reply = client.complete(&request(server.uri())).await.unwrap();
        assert_eq!(reply, "500");
    }

    #[tokio::test]
    async fn slow_server_is_reported_as_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("late")
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let mut req = request(server.uri());
        req.timeout = Duration::from_millis(100);
        let err = HttpCompletionClient::default()
            .complete(&req)
            .await
            .unwrap_err();
        assert!(err.is_timeout(), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_request_error() {
        let err = HttpCompletionClient::default()
            .complete(&request("http://127.0.0.1:9/unreachable".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, CompletionError::Request(_)));
    }
}
