//! Per-channel conversation state.
//!
//! Every channel that has seen activity owns one [`ChannelSession`]. Sessions
//! live only in memory; the save/load context commands are the only way they
//! reach disk. Each entry has its own lock so channels never contend with one
//! another.

use crate::core::message::ConversationTurn;
use crate::storage::ContextSnapshot;
use crate::transport::ChannelId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSession {
    pub channel_id: ChannelId,
    transcript: Vec<ConversationTurn>,
    pub active_model: String,
    pub active_character: Option<String>,
}

impl ChannelSession {
    pub fn new(channel_id: ChannelId, default_model: impl Into<String>) -> Self {
        Self {
            channel_id,
            transcript: Vec::new(),
            active_model: default_model.into(),
            active_character: None,
        }
    }

    pub fn transcript(&self) -> &[ConversationTurn] {
        &self.transcript
    }

    pub fn append(&mut self, turn: ConversationTurn) {
        self.transcript.push(turn);
    }

    pub fn set_model(&mut self, model: impl Into<String>) {
        self.active_model = model.into();
    }

    /// Empties the transcript and forgets the loaded character; the active
    /// model stays as it was.
    pub fn reset(&mut self) {
        self.transcript.clear();
        self.active_character = None;
    }

    /// Starts over with the character's system prompt as the only turn.
    pub fn load_character(&mut self, name: &str, model: &str, prompt: &str) {
        self.transcript = vec![ConversationTurn::system(prompt)];
        self.active_model = model.to_string();
        self.active_character = Some(name.to_string());
    }

    /// Snapshot of this session, labelled with the active model.
    pub fn to_snapshot(&self) -> ContextSnapshot {
        ContextSnapshot {
            channel_id: self.channel_id,
            label: Some(self.active_model.clone()),
            active_character: self.active_character.clone(),
            saved_at: Some(chrono::Utc::now()),
            conversation: self.transcript.clone(),
        }
    }

    /// Replaces transcript, model and character with the snapshot's. A
    /// snapshot without a label leaves the active model untouched.
    pub fn restore(&mut self, snapshot: ContextSnapshot) {
        self.transcript = snapshot.conversation;
        if let Some(label) = snapshot.label {
            self.active_model = label;
        }
        self.active_character = snapshot.active_character;
    }
}

pub type SharedSession = Arc<Mutex<ChannelSession>>;

/// Table of live sessions keyed by channel.
#[derive(Default)]
pub struct SessionStore {
    sessions: StdMutex<HashMap<ChannelId, SharedSession>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the channel's session, creating an empty one on `default_model`
    /// the first time a channel is seen.
    pub fn get_or_create(&self, channel_id: ChannelId, default_model: &str) -> SharedSession {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions
            .entry(channel_id)
            .or_insert_with(|| Arc::new(Mutex::new(ChannelSession::new(channel_id, default_model))))
            .clone()
    }

    pub fn get(&self, channel_id: ChannelId) -> Option<SharedSession> {
        let sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions.get(&channel_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runs `mutate` with the channel's session locked.
    pub async fn with_session<F, T>(&self, channel_id: ChannelId, default_model: &str, mutate: F) -> T
    where
        F: FnOnce(&mut ChannelSession) -> T,
    {
        let session = self.get_or_create(channel_id, default_model);
        let mut guard = session.lock().await;
        mutate(&mut guard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::TranscriptRole;

    #[tokio::test]
    async fn new_sessions_start_empty_on_default_model() {
        let store = SessionStore::new();
        let session = store.get_or_create(ChannelId(1), "gpt-x");
        let guard = session.lock().await;
        assert!(guard.transcript().is_empty());
        assert_eq!(guard.active_model, "gpt-x");
        assert_eq!(guard.active_character, None);
    }

    #[tokio::test]
    async fn existing_session_is_returned_not_recreated() {
        let store = SessionStore::new();
        store
            .with_session(ChannelId(1), "gpt-x", |s| s.set_model("gpt-y"))
            .await;
        let model = store
            .with_session(ChannelId(1), "gpt-x", |s| s.active_model.clone())
            .await;
        assert_eq!(model, "gpt-y");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn channels_are_isolated() {
        let store = SessionStore::new();
        store
            .with_session(ChannelId(1), "gpt-x", |s| {
                s.append(ConversationTurn::user("one"));
                s.set_model("gpt-y");
            })
            .await;
        let other = store
            .with_session(ChannelId(2), "gpt-x", |s| s.clone())
            .await;
        assert!(other.transcript().is_empty());
        assert_eq!(other.active_model, "gpt-x");
    }

    #[test]
    fn appends_keep_call_order() {
        let mut session = ChannelSession::new(ChannelId(1), "gpt-x");
        let contents: Vec<String> = (0..50).map(|i| format!("turn {i}")).collect();
        for (i, content) in contents.iter().enumerate() {
            if i % 2 == 0 {
                session.append(ConversationTurn::user(content.clone()));
            } else {
                session.append(ConversationTurn::assistant(content.clone()));
            }
        }
        let stored: Vec<&str> = session
            .transcript()
            .iter()
            .map(|t| t.content.as_str())
            .collect();
        assert_eq!(stored, contents.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[test]
    fn loading_a_character_leaves_a_single_system_turn() {
        let mut session = ChannelSession::new(ChannelId(1), "gpt-x");
        session.append(ConversationTurn::user("old"));
        session.load_character("Bob", "gpt-y", "You are Bob");

        assert_eq!(session.transcript().len(), 1);
        assert_eq!(session.transcript()[0].role, TranscriptRole::System);
        assert_eq!(session.transcript()[0].content, "You are Bob");
        assert_eq!(session.active_model, "gpt-y");
        assert_eq!(session.active_character.as_deref(), Some("Bob"));
    }

    #[test]
    fn reset_clears_transcript_but_keeps_model() {
        let mut session = ChannelSession::new(ChannelId(1), "gpt-x");
        session.load_character("Bob", "gpt-y", "You are Bob");
        session.reset();
        assert!(session.transcript().is_empty());
        assert_eq!(session.active_model, "gpt-y");
        assert_eq!(session.active_character, None);
    }

    #[test]
    fn snapshot_restore_round_trips() {
        let mut session = ChannelSession::new(ChannelId(1), "gpt-x");
        session.load_character("Bob", "gpt-y", "You are Bob");
        session.append(ConversationTurn::user("hi"));
        let saved = session.clone();
        let snapshot = session.to_snapshot();
        assert_eq!(snapshot.label.as_deref(), Some("gpt-y"));

        session.reset();
        session.set_model("gpt-x");
        session.restore(snapshot);

        assert_eq!(session, saved);
    }
}
