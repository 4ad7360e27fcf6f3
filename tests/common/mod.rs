//! Test helpers for integration tests.
//!
//! Provides a scripted feed source, a recording chat transport, and a helper
//! to serve an axum router on a local port.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::net::TcpListener;

use rssbot::{
    BotError, ChatTransport, Database, FeedItem, FeedSource, FetchedFeed, Result, UserRepository,
};

/// Feed source returning scripted documents.
#[derive(Default)]
pub struct FakeFeedSource {
    feeds: Mutex<HashMap<String, std::result::Result<FetchedFeed, String>>>,
    calls: Mutex<Vec<String>>,
}

impl FakeFeedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `items` under `title` for `url`.
    pub fn set(&self, url: &str, title: &str, items: Vec<FeedItem>) {
        self.feeds.lock().unwrap().insert(
            url.to_string(),
            Ok(FetchedFeed {
                title: title.to_string(),
                items,
            }),
        );
    }

    /// Make fetching `url` fail.
    pub fn fail(&self, url: &str, message: &str) {
        self.feeds
            .lock()
            .unwrap()
            .insert(url.to_string(), Err(message.to_string()));
    }

    /// URLs fetched so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl FeedSource for FakeFeedSource {
    async fn fetch(&self, url: &str) -> Result<FetchedFeed> {
        self.calls.lock().unwrap().push(url.to_string());
        match self.feeds.lock().unwrap().get(url) {
            Some(Ok(feed)) => Ok(feed.clone()),
            Some(Err(message)) => Err(BotError::Fetch(message.clone())),
            None => Err(BotError::Fetch(format!("HTTP error: 404 Not Found ({url})"))),
        }
    }
}

/// Chat transport recording every message it accepts.
#[derive(Clone, Default)]
pub struct RecordingTransport {
    sent: Arc<Mutex<Vec<(i64, String)>>>,
    failing: Arc<Mutex<HashSet<i64>>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every message for `chat_id`.
    pub fn fail_chat(&self, chat_id: i64) {
        self.failing.lock().unwrap().insert(chat_id);
    }

    /// Accepted messages, in order.
    pub fn sent(&self) -> Vec<(i64, String)> {
        self.sent.lock().unwrap().clone()
    }

    /// Accepted messages for one chat.
    pub fn sent_to(&self, chat_id: i64) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter(|(chat, _)| *chat == chat_id)
            .map(|(_, text)| text)
            .collect()
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn send_html(&self, chat_id: i64, text: &str) -> Result<()> {
        if self.failing.lock().unwrap().contains(&chat_id) {
            return Err(BotError::Telegram(
                "sendMessage failed with code 403: Forbidden: bot was blocked by the user"
                    .to_string(),
            ));
        }
        self.sent.lock().unwrap().push((chat_id, text.to_string()));
        Ok(())
    }
}

/// Create an in-memory database.
pub async fn test_db() -> Database {
    Database::open_in_memory()
        .await
        .expect("Failed to create test database")
}

/// Register a chat and return its user ID.
pub async fn register(db: &Database, chat_id: i64) -> i64 {
    UserRepository::new(db.pool())
        .find_or_register(chat_id)
        .await
        .expect("Failed to register user")
}

/// Serve `router` on an ephemeral local port.
pub async fn serve(router: axum::Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test server");
    let addr = listener.local_addr().expect("Failed to get local address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });
    addr
}
