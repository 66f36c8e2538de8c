//! Telegram bot integration: bot setup, handler tree and outbound transport

pub mod bot;
pub mod handlers;
pub mod messages;
pub mod transport;

pub use teloxide::Bot;

pub use bot::{create_bot, setup_bot_commands, Command};
pub use handlers::{schema, HandlerDeps, HandlerError};
pub use transport::{ChatTransport, TelegramTransport};
