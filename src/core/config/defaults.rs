use std::time::Duration;

pub const API_TIMEOUT_SECS: u64 = 30;
pub const RETRY_DELAY_SECS: u64 = 5;
pub const CONFIRMATION_TIMEOUT_SECS: u64 = 15;
pub const MAX_MESSAGE_LENGTH: usize = 2000;
pub const COMMAND_PREFIX: &str = "!";
pub const ERROR_500_MESSAGE: &str =
    "Wait a second everyone, please hold your messages while I think...";

pub(crate) fn api_timeout() -> u64 {
    API_TIMEOUT_SECS
}

pub(crate) fn retry_delay() -> u64 {
    RETRY_DELAY_SECS
}

pub(crate) fn confirmation_timeout() -> u64 {
    CONFIRMATION_TIMEOUT_SECS
}

pub(crate) fn max_message_length() -> usize {
    MAX_MESSAGE_LENGTH
}

pub(crate) fn command_prefix() -> String {
    COMMAND_PREFIX.to_string()
}

pub(crate) fn error_500_message() -> String {
    ERROR_500_MESSAGE.to_string()
}

pub(crate) fn secs(value: u64) -> Duration {
    Duration::from_secs(value)
}

/// Written to `config.toml` on first start when no configuration exists.
pub const CONFIG_TEMPLATE: &str = r#"# relaybot configuration
#
# Everything except bot_token can be changed while the bot is running and
# picked up with the reloadconfig command.

# Credential for the chat platform. Read once at startup.
bot_token = "replace-me"

# Only messages from this channel are answered.
target_channel_id = 0

# OpenAI-compatible chat completions endpoint.
chat_completions_endpoint = "http://localhost:8080/v1/chat/completions"

supported_models = ["default-model"]
default_model = "default-model"

# Seconds to wait for the completion API.
api_timeout = 30

# Sent when the API answers "500", before the single retry.
error_500_message = "Wait a second everyone, please hold your messages while I think..."

# Seconds to wait before that retry.
retry_delay = 5

# Marker that starts a command, e.g. !help
command_prefix = "!"

# Longer replies are split into several messages.
max_message_length = 2000

# Seconds to wait for "yes" before overwriting a saved context.
confirmation_timeout = 15
"#;
