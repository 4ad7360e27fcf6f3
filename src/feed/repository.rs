//! Feed repositories for RSS Bot.

use super::types::{BaselineEntry, Feed, FeedItem};
use crate::db::DbPool;
use crate::Result;

/// Repository for feed operations.
pub struct FeedRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> FeedRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Get a feed by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Feed>> {
        let feed = sqlx::query_as::<_, Feed>("SELECT id, url, title FROM feeds WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(feed)
    }

    /// Get a feed by URL.
    pub async fn get_by_url(&self, url: &str) -> Result<Option<Feed>> {
        let feed = sqlx::query_as::<_, Feed>("SELECT id, url, title FROM feeds WHERE url = ?")
            .bind(url)
            .fetch_optional(self.pool)
            .await?;

        Ok(feed)
    }

    /// List all feeds (ordered by registration order).
    pub async fn list_all(&self) -> Result<Vec<Feed>> {
        let feeds = sqlx::query_as::<_, Feed>("SELECT id, url, title FROM feeds ORDER BY id ASC")
            .fetch_all(self.pool)
            .await?;

        Ok(feeds)
    }

    /// List the feeds a user is subscribed to (ordered by registration order).
    pub async fn list_by_user(&self, user_id: i64) -> Result<Vec<Feed>> {
        let feeds = sqlx::query_as::<_, Feed>(
            r#"
            SELECT f.id, f.url, f.title
            FROM feeds f
            JOIN subscriptions s ON s.feed_id = f.id
            WHERE s.user_id = ?
            ORDER BY f.id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(feeds)
    }

    /// Set the title of a feed.
    pub async fn update_title(&self, id: i64, title: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE feeds SET title = ? WHERE id = ?")
            .bind(title)
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Count feeds.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM feeds")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}

/// Repository for subscription lookups.
pub struct SubscriptionRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> SubscriptionRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Check whether a user is subscribed to a feed.
    pub async fn exists(&self, user_id: i64, feed_id: i64) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM subscriptions WHERE user_id = ? AND feed_id = ?)",
        )
        .bind(user_id)
        .bind(feed_id)
        .fetch_one(self.pool)
        .await?;

        Ok(exists)
    }

    /// Count the subscribers of a feed.
    pub async fn count_by_feed(&self, feed_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM subscriptions WHERE feed_id = ?")
            .bind(feed_id)
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Telegram chat IDs subscribed to a feed (ordered by registration order).
    pub async fn chat_ids_by_feed(&self, feed_id: i64) -> Result<Vec<i64>> {
        let chat_ids = sqlx::query_scalar(
            r#"
            SELECT u.telegram_chat_id
            FROM users u
            JOIN subscriptions s ON s.user_id = u.id
            WHERE s.feed_id = ?
            ORDER BY u.id ASC
            "#,
        )
        .bind(feed_id)
        .fetch_all(self.pool)
        .await?;

        Ok(chat_ids)
    }
}

/// Repository for stored baselines.
pub struct BaselineRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> BaselineRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Get the baseline of a feed.
    pub async fn get(&self, feed_id: i64) -> Result<Vec<BaselineEntry>> {
        let entries = sqlx::query_as::<_, BaselineEntry>(
            "SELECT url, guid FROM baseline_items WHERE feed_id = ?",
        )
        .bind(feed_id)
        .fetch_all(self.pool)
        .await?;

        Ok(entries)
    }

    /// Replace the baseline of a feed with the identities of `items`.
    ///
    /// The delete and the inserts run in one transaction, so readers see
    /// either the old baseline or the new one.
    pub async fn replace(&self, feed_id: i64, items: &[FeedItem]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM baseline_items WHERE feed_id = ?")
            .bind(feed_id)
            .execute(&mut *tx)
            .await?;

        for item in items {
            sqlx::query("INSERT INTO baseline_items (feed_id, url, guid) VALUES (?, ?, ?)")
                .bind(feed_id)
                .bind(&item.url)
                .bind(item.guid())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Count baseline entries of a feed.
    pub async fn count(&self, feed_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM baseline_items WHERE feed_id = ?")
            .bind(feed_id)
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}
