//! Item store used by the updater.

use async_trait::async_trait;

use super::repository::{BaselineRepository, FeedRepository, SubscriptionRepository};
use super::types::{BaselineEntry, Feed, FeedItem};
use crate::db::Database;
use crate::Result;

/// Persistence operations needed by an update cycle.
///
/// Every mutation is scoped to a single feed.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// All tracked feeds, in the order they should be processed.
    async fn list_feeds(&self) -> Result<Vec<Feed>>;

    /// The stored baseline of a feed.
    async fn get_baseline(&self, feed_id: i64) -> Result<Vec<BaselineEntry>>;

    /// Atomically replace the baseline of a feed with the identities of `items`.
    async fn replace_baseline(&self, feed_id: i64, items: &[FeedItem]) -> Result<()>;

    /// Chat IDs subscribed to a feed.
    async fn subscribers(&self, feed_id: i64) -> Result<Vec<i64>>;

    /// Record the latest title of a feed.
    async fn update_title(&self, feed_id: i64, title: &str) -> Result<()>;
}

#[async_trait]
impl ItemStore for Database {
    async fn list_feeds(&self) -> Result<Vec<Feed>> {
        FeedRepository::new(self.pool()).list_all().await
    }

    async fn get_baseline(&self, feed_id: i64) -> Result<Vec<BaselineEntry>> {
        BaselineRepository::new(self.pool()).get(feed_id).await
    }

    async fn replace_baseline(&self, feed_id: i64, items: &[FeedItem]) -> Result<()> {
        BaselineRepository::new(self.pool())
            .replace(feed_id, items)
            .await
    }

    async fn subscribers(&self, feed_id: i64) -> Result<Vec<i64>> {
        SubscriptionRepository::new(self.pool())
            .chat_ids_by_feed(feed_id)
            .await
    }

    async fn update_title(&self, feed_id: i64, title: &str) -> Result<()> {
        FeedRepository::new(self.pool())
            .update_title(feed_id, title)
            .await?;
        Ok(())
    }
}
