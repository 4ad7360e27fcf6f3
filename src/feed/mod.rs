//! Feed tracking for RSS Bot.
//!
//! Fetching, new-item detection, persistence of feeds, subscriptions and
//! delivered-item baselines, and the update cycle tying them together.

pub mod diff;
pub mod fetcher;
pub mod repository;
pub mod service;
pub mod store;
pub mod types;
pub mod updater;

pub use diff::diff;
pub use fetcher::{parse_feed, validate_url, FeedSource, HttpFeedFetcher};
pub use repository::{BaselineRepository, FeedRepository, SubscriptionRepository};
pub use service::SubscriptionService;
pub use store::ItemStore;
pub use types::{BaselineEntry, Feed, FeedItem, FetchedFeed};
pub use updater::{CycleReport, UpdateOrchestrator};
