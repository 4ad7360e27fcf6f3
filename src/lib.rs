//! RSS Bot - RSS/Atom feed notifications over Telegram
//!
//! Users subscribe to feeds by chatting with the bot; a periodic update run
//! detects new items and sends them to every subscriber.

pub mod bot;
pub mod config;
pub mod db;
pub mod delivery;
pub mod error;
pub mod feed;
pub mod logging;
pub mod telegram;

pub use bot::{BotRunner, Command, CommandContext, CommandHandler};
pub use config::Config;
pub use db::{Database, User, UserRepository};
pub use delivery::{ChatTransport, DeliveryGate, DeliveryReport, MessageRenderer, Throttle};
pub use error::{BotError, CommandError, Result};
pub use feed::{
    BaselineEntry, CycleReport, Feed, FeedItem, FeedSource, FetchedFeed, HttpFeedFetcher,
    ItemStore, SubscriptionService, UpdateOrchestrator,
};
pub use telegram::TelegramClient;
