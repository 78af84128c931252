pub mod chat;
pub mod config;
pub mod confirm;
pub mod dispatch;
pub mod message;
pub mod policy;
pub mod relay;
pub mod session;
