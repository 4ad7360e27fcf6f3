//! Telegram Bot API access.

pub mod client;

pub use client::TelegramClient;
pub use frankenstein::{Message, Update, UpdateContent, User};
