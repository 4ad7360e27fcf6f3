//! Database schema and migrations for RSS Bot.
//!
//! Migrations are applied sequentially when the database is first opened or
//! upgraded. The schema_version table tracks which ones have been applied.

/// Database migrations.
pub const MIGRATIONS: &[&str] = &[
    // v1: Initial schema
    r#"
-- Chats that have talked to the bot
CREATE TABLE users (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    telegram_chat_id    INTEGER NOT NULL UNIQUE,
    created_at          TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Tracked feeds, one row per distinct URL
CREATE TABLE feeds (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    url         TEXT NOT NULL UNIQUE,
    title       TEXT NOT NULL DEFAULT '',
    created_at  TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE subscriptions (
    user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    feed_id     INTEGER NOT NULL REFERENCES feeds(id) ON DELETE CASCADE,
    created_at  TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE (user_id, feed_id)
);

CREATE INDEX idx_subscriptions_feed_id ON subscriptions(feed_id);

-- Identities of the items delivered as of the last committed cycle
CREATE TABLE baseline_items (
    feed_id     INTEGER NOT NULL REFERENCES feeds(id) ON DELETE CASCADE,
    url         TEXT NOT NULL,
    guid        TEXT
);

CREATE INDEX idx_baseline_items_feed_id ON baseline_items(feed_id);
"#,
];
