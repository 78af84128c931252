//! Terminal adapter: stdin lines become messages in one channel and replies
//! are printed to stdout. Handy for trying characters and contexts without a
//! chat platform account.

use super::{Author, ChannelId, ChatTransport, InboundEvent, TransportError, UserId};
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::debug;

pub struct ConsoleTransport {
    stdout: Mutex<tokio::io::Stdout>,
}

impl ConsoleTransport {
    pub fn new() -> Self {
        Self {
            stdout: Mutex::new(tokio::io::stdout()),
        }
    }
}

impl Default for ConsoleTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatTransport for ConsoleTransport {
    async fn send(&self, channel: ChannelId, text: &str) -> Result<(), TransportError> {
        let mut stdout = self.stdout.lock().await;
        let line = format!("[#{channel}] {text}\n");
        stdout
            .write_all(line.as_bytes())
            .await
            .map_err(|err| TransportError(err.to_string()))?;
        stdout
            .flush()
            .await
            .map_err(|err| TransportError(err.to_string()))
    }

    async fn typing(&self, channel: ChannelId) -> Result<(), TransportError> {
        debug!(%channel, "typing");
        Ok(())
    }
}

/// Who the console user appears as.
#[derive(Debug, Clone)]
pub struct ConsoleUser {
    pub display_name: String,
    pub alias: Option<String>,
    pub id: UserId,
}

/// Reads stdin until EOF, sending each non-empty line as a message in
/// `channel`. Dropping the sender at EOF lets the dispatch loop drain and stop.
pub fn spawn_stdin_reader(
    channel: ChannelId,
    user: ConsoleUser,
    events: mpsc::Sender<InboundEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut message_id = 0;
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(err) => {
                    debug!(error = %err, "stdin closed");
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            message_id += 1;
            let event = InboundEvent {
                message_id,
                channel_id: channel,
                author: Author {
                    id: user.id,
                    display_name: user.display_name.clone(),
                    alias: user.alias.clone(),
                    is_self: false,
                },
                content: line,
                attachments: Vec::new(),
                reply_to: None,
            };
            if events.send(event).await.is_err() {
                break;
            }
        }
    })
}
