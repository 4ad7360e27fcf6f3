//! Feed types for RSS Bot.

use chrono::{DateTime, Utc};

/// A feed tracked by the bot.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Feed {
    /// Feed ID.
    pub id: i64,
    /// Feed URL (unique).
    pub url: String,
    /// Feed title as last seen by the updater. Empty until the first commit.
    pub title: String,
}

/// An item read from a feed.
///
/// Items are transient: only their identity is persisted, as a [`BaselineEntry`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FeedItem {
    /// Item link.
    pub url: String,
    /// Item title.
    pub title: String,
    /// Item description. Untrusted HTML.
    pub description: String,
    /// Stable identifier, if the feed provides one.
    pub guid: Option<String>,
    /// Publication date.
    pub published_at: Option<DateTime<Utc>>,
}

impl FeedItem {
    /// Create an item with just a link and a title.
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            ..Self::default()
        }
    }

    /// Set the guid. An empty guid is stored as `None`.
    pub fn with_guid(mut self, guid: impl Into<String>) -> Self {
        let guid = guid.into();
        self.guid = if guid.is_empty() { None } else { Some(guid) };
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the publication date.
    pub fn with_published_at(mut self, published_at: DateTime<Utc>) -> Self {
        self.published_at = Some(published_at);
        self
    }

    /// The non-empty guid of this item, if any.
    pub fn guid(&self) -> Option<&str> {
        self.guid.as_deref().filter(|g| !g.is_empty())
    }

    /// Project this item onto its persisted identity.
    pub fn identity(&self) -> BaselineEntry {
        BaselineEntry {
            url: self.url.clone(),
            guid: self.guid().map(str::to_string),
        }
    }
}

/// A parsed feed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedFeed {
    /// Feed title (empty when the feed has none).
    pub title: String,
    /// Items in document order.
    pub items: Vec<FeedItem>,
}

/// Identity of an item delivered in a previous cycle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, sqlx::FromRow)]
pub struct BaselineEntry {
    /// Item link.
    pub url: String,
    /// Item guid, when the feed provided one.
    pub guid: Option<String>,
}

impl BaselineEntry {
    /// Create an entry.
    pub fn new(url: impl Into<String>, guid: Option<&str>) -> Self {
        Self {
            url: url.into(),
            guid: guid.filter(|g| !g.is_empty()).map(str::to_string),
        }
    }
}
