//! Update cycle tests.
//!
//! Runs full cycles against an in-memory database with a scripted feed
//! source and a recording transport.

mod common;

use std::time::Duration;

use async_trait::async_trait;
use rssbot::feed::{BaselineRepository, FeedRepository};
use rssbot::{
    BaselineEntry, BotError, Database, DeliveryGate, Feed, FeedItem, ItemStore, Result,
    SubscriptionService, Throttle, UpdateOrchestrator,
};

use common::{register, test_db, FakeFeedSource, RecordingTransport};

const FEED_A: &str = "https://a.example.com/feed.xml";
const FEED_B: &str = "https://b.example.com/feed.xml";

fn gate(transport: &RecordingTransport, ceiling: u32) -> DeliveryGate<RecordingTransport> {
    DeliveryGate::new(transport.clone(), Throttle::new(ceiling, Duration::ZERO))
}

async fn subscribe(db: &Database, chat_id: i64, url: &str) -> Feed {
    let user_id = register(db, chat_id).await;
    SubscriptionService::new(db)
        .subscribe(user_id, url)
        .await
        .expect("subscribe failed")
}

async fn baseline(db: &Database, feed_id: i64) -> Vec<BaselineEntry> {
    let mut entries = BaselineRepository::new(db.pool())
        .get(feed_id)
        .await
        .unwrap();
    entries.sort();
    entries
}

#[tokio::test]
async fn test_new_item_is_delivered_and_committed() {
    let db = test_db().await;
    let feed = subscribe(&db, 100, FEED_A).await;
    BaselineRepository::new(db.pool())
        .replace(feed.id, &[FeedItem::new("http://x/1", "Old")])
        .await
        .unwrap();

    let source = FakeFeedSource::new();
    source.set(
        FEED_A,
        "Example",
        vec![
            FeedItem::new("http://x/1", "Old"),
            FeedItem::new("http://x/2", "New"),
        ],
    );
    let transport = RecordingTransport::new();

    let mut orchestrator = UpdateOrchestrator::new(&db, &source, gate(&transport, 25));
    let report = orchestrator.run_cycle().await.unwrap();

    assert_eq!(report.feeds, 1);
    assert_eq!(report.updated, 1);
    assert_eq!(report.new_items, 1);
    assert_eq!(report.messages_sent, 2);

    let messages = transport.sent_to(100);
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0], "Updates from the Example feed:");
    assert!(messages[1].starts_with("<b><a href=\"http://x/2\">New</a></b>\n"));

    assert_eq!(
        baseline(&db, feed.id).await,
        vec![
            BaselineEntry::new("http://x/1", None),
            BaselineEntry::new("http://x/2", None),
        ]
    );
}

#[tokio::test]
async fn test_second_cycle_sends_nothing() {
    let db = test_db().await;
    let feed = subscribe(&db, 100, FEED_A).await;

    let source = FakeFeedSource::new();
    source.set(
        FEED_A,
        "Example",
        vec![
            FeedItem::new("http://x/1", "One").with_guid("g1"),
            FeedItem::new("http://x/2", "Two").with_guid("g2"),
        ],
    );
    let transport = RecordingTransport::new();
    let mut orchestrator = UpdateOrchestrator::new(&db, &source, gate(&transport, 25));

    let first = orchestrator.run_cycle().await.unwrap();
    assert_eq!(first.new_items, 2);
    let before = baseline(&db, feed.id).await;

    let second = orchestrator.run_cycle().await.unwrap();
    assert_eq!(second.unchanged, 1);
    assert_eq!(second.updated, 0);
    assert_eq!(second.messages_sent, 0);
    assert_eq!(transport.sent().len(), 3);
    assert_eq!(baseline(&db, feed.id).await, before);
}

#[tokio::test]
async fn test_empty_baseline_sends_every_item() {
    let db = test_db().await;
    subscribe(&db, 100, FEED_A).await;

    let source = FakeFeedSource::new();
    source.set(
        FEED_A,
        "Example",
        (1..=5)
            .map(|i| FeedItem::new(format!("http://x/{i}"), format!("Item {i}")))
            .collect(),
    );
    let transport = RecordingTransport::new();

    let report = UpdateOrchestrator::new(&db, &source, gate(&transport, 25))
        .run_cycle()
        .await
        .unwrap();

    assert_eq!(report.new_items, 5);
    assert_eq!(transport.sent_to(100).len(), 6);
}

#[tokio::test]
async fn test_guid_match_survives_url_change() {
    let db = test_db().await;
    let feed = subscribe(&db, 100, FEED_A).await;
    BaselineRepository::new(db.pool())
        .replace(feed.id, &[FeedItem::new("http://x/1", "One").with_guid("g1")])
        .await
        .unwrap();

    let source = FakeFeedSource::new();
    source.set(
        FEED_A,
        "Example",
        vec![FeedItem::new("http://x/1?utm=1", "One").with_guid("g1")],
    );
    let transport = RecordingTransport::new();

    let report = UpdateOrchestrator::new(&db, &source, gate(&transport, 25))
        .run_cycle()
        .await
        .unwrap();

    assert_eq!(report.unchanged, 1);
    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn test_fetch_failure_skips_only_that_feed() {
    let db = test_db().await;
    let feed_a = subscribe(&db, 100, FEED_A).await;
    let feed_b = subscribe(&db, 100, FEED_B).await;
    BaselineRepository::new(db.pool())
        .replace(feed_a.id, &[FeedItem::new("http://a/1", "A1")])
        .await
        .unwrap();

    let source = FakeFeedSource::new();
    source.fail(FEED_A, "connection refused");
    source.set(FEED_B, "B", vec![FeedItem::new("http://b/1", "B1")]);
    let transport = RecordingTransport::new();

    let report = UpdateOrchestrator::new(&db, &source, gate(&transport, 25))
        .run_cycle()
        .await
        .unwrap();

    assert_eq!(report.fetch_failures, 1);
    assert_eq!(report.updated, 1);
    assert_eq!(source.calls(), vec![FEED_A.to_string(), FEED_B.to_string()]);
    assert_eq!(
        baseline(&db, feed_a.id).await,
        vec![BaselineEntry::new("http://a/1", None)]
    );
    assert_eq!(
        baseline(&db, feed_b.id).await,
        vec![BaselineEntry::new("http://b/1", None)]
    );
    assert_eq!(transport.sent_to(100)[0], "Updates from the B feed:");
}

#[tokio::test]
async fn test_delivery_failure_still_commits() {
    let db = test_db().await;
    let feed = subscribe(&db, 100, FEED_A).await;
    subscribe(&db, 200, FEED_A).await;

    let source = FakeFeedSource::new();
    source.set(FEED_A, "Example", vec![FeedItem::new("http://x/1", "One")]);
    let transport = RecordingTransport::new();
    transport.fail_chat(100);

    let mut orchestrator = UpdateOrchestrator::new(&db, &source, gate(&transport, 25));
    let report = orchestrator.run_cycle().await.unwrap();

    assert_eq!(report.delivery_failures, 1);
    assert_eq!(report.messages_sent, 2);
    assert!(transport.sent_to(100).is_empty());
    assert_eq!(transport.sent_to(200).len(), 2);
    assert_eq!(
        baseline(&db, feed.id).await,
        vec![BaselineEntry::new("http://x/1", None)]
    );

    // At-most-once: the failed chat does not get the item on the next run
    let again = orchestrator.run_cycle().await.unwrap();
    assert_eq!(again.unchanged, 1);
    assert_eq!(transport.sent().len(), 2);
}

#[tokio::test]
async fn test_rate_limit_pauses() {
    let db = test_db().await;
    for chat_id in [1, 2, 3] {
        subscribe(&db, chat_id, FEED_A).await;
    }

    let source = FakeFeedSource::new();
    source.set(
        FEED_A,
        "Example",
        (0..19)
            .map(|i| FeedItem::new(format!("http://x/{i}"), format!("Item {i}")))
            .collect(),
    );
    let transport = RecordingTransport::new();

    let mut orchestrator = UpdateOrchestrator::new(&db, &source, gate(&transport, 25));
    let report = orchestrator.run_cycle().await.unwrap();

    assert_eq!(report.messages_sent, 60);
    assert!(orchestrator.gate().throttle().pauses() >= 2);
}

#[tokio::test]
async fn test_feed_title_is_recorded() {
    let db = test_db().await;
    let feed = subscribe(&db, 100, FEED_A).await;
    assert_eq!(feed.title, "");

    let source = FakeFeedSource::new();
    source.set(FEED_A, "Example News", vec![FeedItem::new("http://x/1", "One")]);
    let transport = RecordingTransport::new();

    UpdateOrchestrator::new(&db, &source, gate(&transport, 25))
        .run_cycle()
        .await
        .unwrap();

    let stored = FeedRepository::new(db.pool())
        .get_by_id(feed.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.title, "Example News");
}

#[tokio::test]
async fn test_untitled_feed_uses_url_in_header() {
    let db = test_db().await;
    subscribe(&db, 100, FEED_A).await;

    let source = FakeFeedSource::new();
    source.set(FEED_A, "", vec![FeedItem::new("http://x/1", "One")]);
    let transport = RecordingTransport::new();

    UpdateOrchestrator::new(&db, &source, gate(&transport, 25))
        .run_cycle()
        .await
        .unwrap();

    assert_eq!(
        transport.sent_to(100)[0],
        format!("Updates from the {FEED_A} feed:")
    );
}

#[tokio::test]
async fn test_no_feeds() {
    let db = test_db().await;
    let source = FakeFeedSource::new();
    let transport = RecordingTransport::new();

    let report = UpdateOrchestrator::new(&db, &source, gate(&transport, 25))
        .run_cycle()
        .await
        .unwrap();

    assert_eq!(report, rssbot::CycleReport::default());
    assert!(source.calls().is_empty());
}

/// Store that fails selected operations and delegates the rest.
struct FlakyStore {
    inner: Database,
    broken_feed: Option<i64>,
    broken_listing: bool,
    broken_titles: bool,
}

#[async_trait]
impl ItemStore for FlakyStore {
    async fn list_feeds(&self) -> Result<Vec<Feed>> {
        if self.broken_listing {
            return Err(BotError::Database("database is locked".to_string()));
        }
        self.inner.list_feeds().await
    }

    async fn get_baseline(&self, feed_id: i64) -> Result<Vec<BaselineEntry>> {
        if self.broken_feed == Some(feed_id) {
            return Err(BotError::Database("disk I/O error".to_string()));
        }
        self.inner.get_baseline(feed_id).await
    }

    async fn replace_baseline(&self, feed_id: i64, items: &[FeedItem]) -> Result<()> {
        self.inner.replace_baseline(feed_id, items).await
    }

    async fn subscribers(&self, feed_id: i64) -> Result<Vec<i64>> {
        self.inner.subscribers(feed_id).await
    }

    async fn update_title(&self, feed_id: i64, title: &str) -> Result<()> {
        if self.broken_titles {
            return Err(BotError::Database("attempt to write a readonly database".to_string()));
        }
        self.inner.update_title(feed_id, title).await
    }
}

#[tokio::test]
async fn test_store_failure_skips_only_that_feed() {
    let db = test_db().await;
    let feed_a = subscribe(&db, 100, FEED_A).await;
    let feed_b = subscribe(&db, 100, FEED_B).await;

    let source = FakeFeedSource::new();
    source.set(FEED_A, "A", vec![FeedItem::new("http://a/1", "A1")]);
    source.set(FEED_B, "B", vec![FeedItem::new("http://b/1", "B1")]);
    let transport = RecordingTransport::new();

    let store = FlakyStore {
        inner: db.clone(),
        broken_feed: Some(feed_a.id),
        broken_listing: false,
        broken_titles: false,
    };
    let report = UpdateOrchestrator::new(&store, &source, gate(&transport, 25))
        .run_cycle()
        .await
        .unwrap();

    assert_eq!(report.store_failures, 1);
    assert_eq!(report.updated, 1);
    assert!(baseline(&db, feed_a.id).await.is_empty());
    assert_eq!(baseline(&db, feed_b.id).await.len(), 1);
}

#[tokio::test]
async fn test_listing_failure_aborts_cycle() {
    let db = test_db().await;
    subscribe(&db, 100, FEED_A).await;

    let source = FakeFeedSource::new();
    let transport = RecordingTransport::new();
    let store = FlakyStore {
        inner: db,
        broken_feed: None,
        broken_listing: true,
        broken_titles: false,
    };

    let result = UpdateOrchestrator::new(&store, &source, gate(&transport, 25))
        .run_cycle()
        .await;

    assert!(result.is_err());
    assert!(source.calls().is_empty());
}

#[tokio::test]
async fn test_title_failure_does_not_block_delivery_or_commit() {
    let db = test_db().await;
    let feed = subscribe(&db, 100, FEED_A).await;

    let source = FakeFeedSource::new();
    source.set(FEED_A, "Renamed", vec![FeedItem::new("http://a/1", "A1")]);
    let transport = RecordingTransport::new();
    let store = FlakyStore {
        inner: db.clone(),
        broken_feed: None,
        broken_listing: false,
        broken_titles: true,
    };

    let report = UpdateOrchestrator::new(&store, &source, gate(&transport, 25))
        .run_cycle()
        .await
        .unwrap();

    assert_eq!(report.updated, 1);
    assert_eq!(report.store_failures, 0);
    assert_eq!(transport.sent_to(100).len(), 2);
    assert_eq!(baseline(&db, feed.id).await.len(), 1);

    let stored = FeedRepository::new(db.pool())
        .get_by_id(feed.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.title, "");
}
