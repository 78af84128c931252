//! relaybot is a chat-channel bot that relays a per-channel conversation to a
//! remote chat-completion API and posts the reply back.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns runtime configuration, per-channel sessions, the retry
//!   policy and the dispatch loop.
//! - [`commands`] implements prefix-command parsing and the command handlers.
//! - [`storage`] persists characters and named context snapshots.
//! - [`api`] defines the completion request payload and the HTTP client.
//! - [`transport`] is the seam to a chat platform.
//!
//! The binary (`src/main.rs`) routes through [`crate::cli::main`].

pub mod api;
pub mod cli;
pub mod commands;
pub mod core;
pub mod storage;
pub mod transport;
pub mod utils;
