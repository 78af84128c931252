pub(super) mod character;
pub(super) mod config;
pub(super) mod context;
pub(super) mod core;
