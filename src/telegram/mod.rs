//! Telegram-facing layer: commands, scenes, handlers, formatting

pub mod bot;
pub mod callback;
pub mod commands;
pub mod format;
pub mod handlers;
pub mod keyboards;
pub mod scenes;

pub use bot::{create_bot, setup_bot_commands};
pub use callback::CallbackAction;
pub use commands::{is_protected_command, Command};
pub use handlers::{schema, HandlerDeps, HandlerError};

/// Bot type used throughout the crate
pub type Bot = teloxide::Bot;
