//! Command-line interface parsing and handling
//!
//! This module parses arguments, sets up logging, bootstraps the config file
//! and runs the dispatch loop.

use std::error::Error;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::api::HttpCompletionClient;
use crate::core::config::data::path_display;
use crate::core::config::io::write_template_if_missing;
use crate::core::config::{ConfigFile, ConfigHandle, DataPaths};
use crate::core::dispatch::run_dispatch_loop;
use crate::core::relay::Relay;
use crate::transport::console::{spawn_stdin_reader, ConsoleTransport, ConsoleUser};
use crate::transport::UserId;

const GIT_SHA: &str = match option_env!("VERGEN_GIT_SHA") {
    Some(sha) => sha,
    None => "unknown",
};

const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);
const DEFAULT_LOG_FILTER: &str = "relaybot=info";
const TEMPLATE_PLACEHOLDER_TOKEN: &str = "replace-me";

#[derive(Parser)]
#[command(name = "relaybot", version)]
#[command(about = "Relay a chat channel to an OpenAI-compatible completion API")]
#[command(
    long_about = "relaybot keeps a rolling conversation per chat channel, sends it to a \
chat-completion endpoint and posts the reply back. Characters bundle a model and a \
system prompt; contexts save and restore a channel's conversation.\n\n\
Files (in the data directory):\n\
  config.toml       Bot settings (created from a template on first start)\n\
  characters.toml   Saved characters\n\
  contexts/         Saved conversation contexts\n\n\
Environment Variables:\n\
  RELAYBOT_DATA_DIR Data directory (defaults to the platform config directory)\n\
  RUST_LOG          Log filter when --log-level is not given"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Directory holding config.toml, characters.toml and contexts/
    #[arg(long, global = true, env = "RELAYBOT_DATA_DIR", value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Log filter, e.g. "relaybot=debug"
    #[arg(long, global = true, value_name = "FILTER")]
    pub log_level: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the bot on the terminal (default)
    Run {
        /// Display name used for messages typed on stdin
        #[arg(long, default_value = "console")]
        author: String,
        /// Optional nickname shown next to the display name
        #[arg(long)]
        alias: Option<String>,
        /// Numeric user id for messages typed on stdin
        #[arg(long, default_value_t = 1)]
        author_id: u64,
    },
    /// Write the config template if none exists yet
    Init,
}

fn init_tracing(log_level: Option<&str>) {
    let filter = match log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn resolve_paths(data_dir: Option<PathBuf>) -> Result<DataPaths, Box<dyn Error>> {
    match data_dir {
        Some(dir) => Ok(DataPaths::new(dir)),
        None => DataPaths::platform_default()
            .ok_or_else(|| "Failed to determine config directory; pass --data-dir".into()),
    }
}

pub fn main() -> Result<(), Box<dyn Error>> {
    run_to_completion(tokio::runtime::Runtime::new()?, async_main())
}

/// Drives `future` and then shuts the runtime down without waiting on
/// blocking tasks. The stdin reader may be parked in a read that only returns
/// on the next line.
fn run_to_completion<F: Future>(runtime: tokio::runtime::Runtime, future: F) -> F::Output {
    let output = runtime.block_on(future);
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    output
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_tracing(args.log_level.as_deref());
    let paths = resolve_paths(args.data_dir)?;

    match args.command.unwrap_or(Commands::Run {
        author: "console".to_string(),
        alias: None,
        author_id: 1,
    }) {
        Commands::Init => {
            let config_path = paths.config_file();
            if write_template_if_missing(&config_path)? {
                println!("Created {}", path_display(&config_path));
            } else {
                println!("Config already exists at {}", path_display(&config_path));
            }
            Ok(())
        }
        Commands::Run {
            author,
            alias,
            author_id,
        } => {
            let user = ConsoleUser {
                display_name: author,
                alias,
                id: UserId(author_id),
            };
            run(paths, user).await
        }
    }
}

async fn run(paths: DataPaths, user: ConsoleUser) -> Result<(), Box<dyn Error>> {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        git_sha = GIT_SHA,
        data_dir = %path_display(paths.root()),
        "starting relaybot"
    );

    let config_path = paths.config_file();
    if write_template_if_missing(&config_path)? {
        info!(path = %path_display(&config_path), "wrote config template");
        eprintln!(
            "No config found. A new one has been created at '{}'.",
            path_display(&config_path)
        );
        eprintln!("Please edit it with your real settings, then restart the bot.");
        return Ok(());
    }

    let (bot_token, runtime) = match ConfigFile::load_runtime(&config_path) {
        Ok(loaded) => loaded,
        Err(err) => {
            eprintln!("❌ {err}");
            std::process::exit(1);
        }
    };
    if bot_token.trim().is_empty() || bot_token == TEMPLATE_PLACEHOLDER_TOKEN {
        warn!("bot_token is not set; platform adapters will be unable to connect");
    }

    let target_channel = runtime.target_channel;
    info!(
        channel = %target_channel,
        endpoint = %runtime.endpoint_url,
        default_model = %runtime.default_model,
        "configuration loaded"
    );

    let config = ConfigHandle::new(config_path, runtime);
    let relay = Arc::new(Relay::new(
        config,
        &paths,
        Arc::new(HttpCompletionClient::default()),
        Arc::new(ConsoleTransport::new()),
    ));

    let shutdown = CancellationToken::new();
    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received");
            ctrl_c.cancel();
        }
    });

    let (tx, rx) = mpsc::channel(64);
    let reader = spawn_stdin_reader(target_channel, user, tx);
    run_dispatch_loop(relay, rx, shutdown).await;
    reader.abort();
    Ok(())
}
