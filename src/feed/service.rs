//! Subscription service for RSS Bot.
//!
//! High-level subscribe/unsubscribe/list operations used by the command
//! layer. Errors the user can act on are returned as
//! [`CommandError::Displayable`].

use tracing::{debug, info};

use super::fetcher::validate_url;
use super::repository::FeedRepository;
use super::types::Feed;
use crate::db::Database;
use crate::CommandError;

/// Service for subscription operations.
pub struct SubscriptionService<'a> {
    db: &'a Database,
}

impl<'a> SubscriptionService<'a> {
    /// Create a new SubscriptionService with the given database reference.
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Subscribe a user to the feed at `url`, creating the feed if needed.
    ///
    /// # Errors
    ///
    /// Returns a displayable error if:
    /// - The URL is not an acceptable http(s) feed URL
    /// - The user is already subscribed
    pub async fn subscribe(&self, user_id: i64, url: &str) -> Result<Feed, CommandError> {
        check_url(url)?;

        let mut tx = self.db.begin().await?;

        sqlx::query("INSERT OR IGNORE INTO feeds (url) VALUES (?)")
            .bind(url)
            .execute(&mut *tx)
            .await?;

        let feed = sqlx::query_as::<_, Feed>("SELECT id, url, title FROM feeds WHERE url = ?")
            .bind(url)
            .fetch_one(&mut *tx)
            .await?;

        let inserted = sqlx::query(
            "INSERT OR IGNORE INTO subscriptions (user_id, feed_id) VALUES (?, ?)",
        )
        .bind(user_id)
        .bind(feed.id)
        .execute(&mut *tx)
        .await?;

        if inserted.rows_affected() == 0 {
            // Nothing was created, the rollback is a no-op
            return Err(CommandError::displayable("Already subscribed"));
        }

        tx.commit().await?;

        info!("User {} subscribed to feed {} ({})", user_id, feed.id, feed.url);
        Ok(feed)
    }

    /// Unsubscribe a user from the feed at `url`.
    ///
    /// The feed and its baseline are removed when its last subscriber leaves.
    ///
    /// # Errors
    ///
    /// Returns a displayable error if:
    /// - The URL is not an acceptable http(s) feed URL
    /// - No feed is registered for the URL
    /// - The user is not subscribed to it
    pub async fn unsubscribe(&self, user_id: i64, url: &str) -> Result<(), CommandError> {
        check_url(url)?;

        let mut tx = self.db.begin().await?;

        let feed_id: Option<i64> = sqlx::query_scalar("SELECT id FROM feeds WHERE url = ?")
            .bind(url)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(feed_id) = feed_id else {
            return Err(CommandError::displayable("Feed does not exist"));
        };

        let removed = sqlx::query("DELETE FROM subscriptions WHERE user_id = ? AND feed_id = ?")
            .bind(user_id)
            .bind(feed_id)
            .execute(&mut *tx)
            .await?;

        if removed.rows_affected() == 0 {
            return Err(CommandError::displayable("Not subscribed"));
        }

        let remaining: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM subscriptions WHERE feed_id = ?")
                .bind(feed_id)
                .fetch_one(&mut *tx)
                .await?;

        if remaining == 0 {
            sqlx::query("DELETE FROM feeds WHERE id = ?")
                .bind(feed_id)
                .execute(&mut *tx)
                .await?;
            debug!("Feed {} has no subscribers left, removed", feed_id);
        }

        tx.commit().await?;

        info!("User {} unsubscribed from feed {}", user_id, feed_id);
        Ok(())
    }

    /// List the feeds a user is subscribed to.
    pub async fn list_feeds_for(&self, user_id: i64) -> Result<Vec<Feed>, CommandError> {
        Ok(FeedRepository::new(self.db.pool())
            .list_by_user(user_id)
            .await?)
    }
}

fn check_url(url: &str) -> Result<(), CommandError> {
    validate_url(url).map_err(|e| {
        debug!("Rejected feed URL {:?}: {}", url, e);
        CommandError::displayable("Invalid feed URL")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::UserRepository;
    use crate::feed::repository::{BaselineRepository, SubscriptionRepository};
    use crate::feed::FeedItem;

    async fn setup() -> (Database, i64) {
        let db = Database::open_in_memory().await.unwrap();
        let user_id = UserRepository::new(db.pool())
            .find_or_register(42)
            .await
            .unwrap();
        (db, user_id)
    }

    fn displayed(err: CommandError) -> String {
        match err {
            CommandError::Displayable(msg) => msg,
            CommandError::Internal(e) => panic!("unexpected internal error: {e}"),
        }
    }

    #[tokio::test]
    async fn test_subscribe_creates_feed() {
        let (db, user_id) = setup().await;
        let service = SubscriptionService::new(&db);

        let feed = service
            .subscribe(user_id, "https://example.com/feed.xml")
            .await
            .unwrap();
        assert_eq!(feed.url, "https://example.com/feed.xml");

        let feeds = service.list_feeds_for(user_id).await.unwrap();
        assert_eq!(feeds, vec![feed]);
    }

    #[tokio::test]
    async fn test_subscribe_twice() {
        let (db, user_id) = setup().await;
        let service = SubscriptionService::new(&db);

        service
            .subscribe(user_id, "https://example.com/feed.xml")
            .await
            .unwrap();
        let err = service
            .subscribe(user_id, "https://example.com/feed.xml")
            .await
            .unwrap_err();
        assert_eq!(displayed(err), "Already subscribed");
    }

    #[tokio::test]
    async fn test_subscribe_shares_existing_feed() {
        let (db, alice) = setup().await;
        let bob = UserRepository::new(db.pool())
            .find_or_register(43)
            .await
            .unwrap();
        let service = SubscriptionService::new(&db);

        let a = service.subscribe(alice, "https://example.com/rss").await.unwrap();
        let b = service.subscribe(bob, "https://example.com/rss").await.unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(FeedRepository::new(db.pool()).count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_subscribe_invalid_url() {
        let (db, user_id) = setup().await;
        let service = SubscriptionService::new(&db);

        for url in ["not a url", "ftp://example.com/feed", "http://127.0.0.1/feed", "http://localhost/"] {
            let err = service.subscribe(user_id, url).await.unwrap_err();
            assert_eq!(displayed(err), "Invalid feed URL", "url: {url}");
        }
        assert_eq!(FeedRepository::new(db.pool()).count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unsubscribe_unknown_feed() {
        let (db, user_id) = setup().await;
        let err = SubscriptionService::new(&db)
            .unsubscribe(user_id, "https://example.com/feed.xml")
            .await
            .unwrap_err();
        assert_eq!(displayed(err), "Feed does not exist");
    }

    #[tokio::test]
    async fn test_unsubscribe_not_subscribed() {
        let (db, alice) = setup().await;
        let bob = UserRepository::new(db.pool())
            .find_or_register(43)
            .await
            .unwrap();
        let service = SubscriptionService::new(&db);
        service.subscribe(alice, "https://example.com/rss").await.unwrap();

        let err = service
            .unsubscribe(bob, "https://example.com/rss")
            .await
            .unwrap_err();
        assert_eq!(displayed(err), "Not subscribed");
    }

    #[tokio::test]
    async fn test_unsubscribe_keeps_feed_with_other_subscribers() {
        let (db, alice) = setup().await;
        let bob = UserRepository::new(db.pool())
            .find_or_register(43)
            .await
            .unwrap();
        let service = SubscriptionService::new(&db);
        let feed = service.subscribe(alice, "https://example.com/rss").await.unwrap();
        service.subscribe(bob, "https://example.com/rss").await.unwrap();

        service.unsubscribe(alice, "https://example.com/rss").await.unwrap();

        let subs = SubscriptionRepository::new(db.pool());
        assert_eq!(subs.chat_ids_by_feed(feed.id).await.unwrap(), vec![43]);
        assert!(service.list_feeds_for(alice).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_last_unsubscribe_removes_feed_and_baseline() {
        let (db, user_id) = setup().await;
        let service = SubscriptionService::new(&db);
        let feed = service.subscribe(user_id, "https://example.com/rss").await.unwrap();
        BaselineRepository::new(db.pool())
            .replace(feed.id, &[FeedItem::new("http://x/1", "One")])
            .await
            .unwrap();

        service.unsubscribe(user_id, "https://example.com/rss").await.unwrap();

        let feeds = FeedRepository::new(db.pool());
        assert!(feeds.get_by_url("https://example.com/rss").await.unwrap().is_none());
        assert_eq!(BaselineRepository::new(db.pool()).count(feed.id).await.unwrap(), 0);

        let again = service.subscribe(user_id, "https://example.com/rss").await.unwrap();
        assert!(BaselineRepository::new(db.pool()).get(again.id).await.unwrap().is_empty());
    }
}
