//! User model for RSS Bot.

/// A chat known to the bot.
///
/// Users are registered lazily the first time a chat sends a command.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct User {
    /// Unique user ID.
    pub id: i64,
    /// Telegram chat ID that notifications are delivered to.
    pub telegram_chat_id: i64,
    /// Registration timestamp.
    pub created_at: String,
}
