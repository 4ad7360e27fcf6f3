//! User repository for RSS Bot.

use super::{DbPool, User};
use crate::{BotError, Result};

/// Repository for user operations.
pub struct UserRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new UserRepository with the given database pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Get a user by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, telegram_chat_id, created_at FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Get a user by Telegram chat ID.
    pub async fn get_by_chat_id(&self, chat_id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, telegram_chat_id, created_at FROM users WHERE telegram_chat_id = ?",
        )
        .bind(chat_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Return the ID of the user for `chat_id`, registering it if needed.
    pub async fn find_or_register(&self, chat_id: i64) -> Result<i64> {
        if let Some(user) = self.get_by_chat_id(chat_id).await? {
            return Ok(user.id);
        }

        sqlx::query("INSERT OR IGNORE INTO users (telegram_chat_id) VALUES (?)")
            .bind(chat_id)
            .execute(self.pool)
            .await?;

        self.get_by_chat_id(chat_id)
            .await?
            .map(|user| user.id)
            .ok_or_else(|| BotError::NotFound("user".to_string()))
    }

    /// Count registered users.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}
