use crate::core::message::ConversationTurn;
use serde::Serialize;

pub mod completion;

pub use completion::{
    normalize_reply, parse_reply_body, CompletionBackend, CompletionError, CompletionRequest,
    HttpCompletionClient, ReplyBody,
};

pub const DEFAULT_TEMPERATURE: f64 = 0.7;

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Serialize, Debug)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
}

impl From<&ConversationTurn> for ChatMessage {
    fn from(turn: &ConversationTurn) -> Self {
        Self {
            role: turn.role.as_str().to_string(),
            content: turn.content.clone(),
        }
    }
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, transcript: &[ConversationTurn]) -> Self {
        Self {
            model: model.into(),
            messages: transcript.iter().map(ChatMessage::from).collect(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}
