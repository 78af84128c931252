use crate::api::{CompletionBackend, CompletionError, CompletionRequest};
use crate::core::config::{ConfigFile, ConfigHandle, DataPaths, RuntimeConfig};
use crate::core::relay::Relay;
use crate::transport::{Author, ChannelId, ChatTransport, InboundEvent, TransportError, UserId};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

pub const TEST_CHANNEL: ChannelId = ChannelId(1);

pub fn event_from(channel: u64, user: u64, name: &str, content: &str) -> InboundEvent {
    InboundEvent {
        message_id: 0,
        channel_id: ChannelId(channel),
        author: Author {
            id: UserId(user),
            display_name: name.to_string(),
            alias: None,
            is_self: false,
        },
        content: content.to_string(),
        attachments: Vec::new(),
        reply_to: None,
    }
}

/// Message from "alice" (id 42) in [`TEST_CHANNEL`].
pub fn alice(content: &str) -> InboundEvent {
    event_from(TEST_CHANNEL.0, 42, "alice", content)
}

pub fn test_config_file() -> ConfigFile {
    ConfigFile {
        bot_token: "test-token".to_string(),
        target_channel_id: TEST_CHANNEL,
        chat_completions_endpoint: "http://completions.test/v1/chat/completions".to_string(),
        supported_models: vec!["gpt-x".to_string(), "gpt-y".to_string()],
        default_model: "gpt-x".to_string(),
        api_timeout: 30,
        error_500_message: "Hold on...".to_string(),
        retry_delay: 5,
        command_prefix: "!".to_string(),
        max_message_length: 2000,
        confirmation_timeout: 15,
    }
}

pub fn test_runtime_config() -> RuntimeConfig {
    test_config_file().runtime().expect("test config is valid")
}

#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<(ChannelId, String)>>,
    typing: AtomicUsize,
}

impl RecordingTransport {
    pub fn sent_texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(_, text)| text.clone())
            .collect()
    }

    pub fn last_text(&self) -> Option<String> {
        self.sent.lock().unwrap().last().map(|(_, text)| text.clone())
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }

    pub fn typing_hints(&self) -> usize {
        self.typing.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn send(&self, channel: ChannelId, text: &str) -> Result<(), TransportError> {
        self.sent.lock().unwrap().push((channel, text.to_string()));
        Ok(())
    }

    async fn typing(&self, _channel: ChannelId) -> Result<(), TransportError> {
        self.typing.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub enum ScriptedReply {
    Text(String),
    Timeout,
    /// Never answers; exercises the caller's timeout.
    Hang,
}

impl ScriptedReply {
    pub fn text(text: &str) -> Self {
        ScriptedReply::Text(text.to_string())
    }
}

/// Backend that plays back canned replies in order. An exhausted script
/// answers with an empty string.
#[derive(Default)]
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<ScriptedReply>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedBackend {
    pub fn new(replies: Vec<ScriptedReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn push(&self, reply: ScriptedReply) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionBackend for ScriptedBackend {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some(ScriptedReply::Text(text)) => Ok(text),
            Some(ScriptedReply::Timeout) => Err(CompletionError::Timeout(Duration::from_secs(30))),
            Some(ScriptedReply::Hang) => std::future::pending().await,
            None => Ok(String::new()),
        }
    }
}

/// A [`Relay`] wired to fakes, with its data directory in a temp dir.
pub struct TestHarness {
    pub relay: Arc<Relay>,
    pub transport: Arc<RecordingTransport>,
    pub backend: Arc<ScriptedBackend>,
    pub paths: DataPaths,
    _dir: TempDir,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_config(test_config_file())
    }

    pub fn with_config(file: ConfigFile) -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let paths = DataPaths::new(dir.path());
        let contents = toml::to_string_pretty(&file).expect("serialize config");
        std::fs::write(paths.config_file(), contents).expect("write config");
        let runtime = file.runtime().expect("valid config");

        let transport = Arc::new(RecordingTransport::default());
        let backend = Arc::new(ScriptedBackend::default());
        let relay = Arc::new(Relay::new(
            ConfigHandle::new(paths.config_file(), runtime),
            &paths,
            backend.clone(),
            transport.clone(),
        ));

        Self {
            relay,
            transport,
            backend,
            paths,
            _dir: dir,
        }
    }

    /// Handles `content` from alice in the test channel.
    pub async fn say(&self, content: &str) {
        self.relay.handle_event(alice(content)).await;
    }

    pub async fn session(&self) -> crate::core::session::ChannelSession {
        let session = self
            .relay
            .sessions
            .get(TEST_CHANNEL)
            .expect("session exists");
        let guard = session.lock().await;
        guard.clone()
    }
}
