//! Notification message rendering.
//!
//! Messages are sent with Telegram's HTML parse mode, so every piece of feed
//! content is either escaped or passed through an allow-list sanitizer.

use std::collections::HashSet;

use ammonia::{Builder, UrlRelative};
use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::feed::FeedItem;

/// Telegram's message length limit, in characters.
pub const MAX_MESSAGE_CHARS: usize = 4096;

/// Longest item title kept in a message.
const MAX_TITLE_CHARS: usize = 512;

/// Longest escaped link kept in a message. Longer links are dropped.
const MAX_URL_CHARS: usize = 1024;

/// Publication date format (always UTC).
const DATE_FORMAT: &str = "%m.%d.%Y %H:%M";

const ELLIPSIS: &str = "...";

/// Inline formatting tags Telegram understands.
const ALLOWED_TAGS: [&str; 12] = [
    "a", "b", "strong", "i", "em", "u", "ins", "s", "strike", "del", "code", "pre",
];

/// Renders feed items into Telegram HTML messages.
pub struct MessageRenderer {
    sanitizer: Builder<'static>,
}

impl Default for MessageRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageRenderer {
    /// Create a renderer with the standard allow-list.
    pub fn new() -> Self {
        let mut sanitizer = Builder::empty();
        sanitizer
            .add_tags(&ALLOWED_TAGS)
            .add_tag_attributes("a", &["href"])
            .url_schemes(HashSet::from(["http", "https"]))
            .url_relative(UrlRelative::Deny)
            .link_rel(None)
            .clean_content_tags(HashSet::from(["script", "style"]))
            .strip_comments(true);

        Self { sanitizer }
    }

    /// Header message sent before the items of a feed.
    pub fn header(&self, feed_title: &str) -> String {
        format!("Updates from the {} feed:", encode_text(feed_title))
    }

    /// Message for a single item.
    pub fn item(&self, item: &FeedItem) -> String {
        let (title, _) = truncate_chars(&item.title, MAX_TITLE_CHARS);
        let title = encode_text(title);
        let href = encode_double_quoted_attribute(&item.url);
        let mut message = if href.chars().count() > MAX_URL_CHARS {
            format!("<b>{}</b>\n", title)
        } else {
            format!("<b><a href=\"{}\">{}</a></b>\n", href, title)
        };
        if let Some(published_at) = item.published_at {
            message.push_str(&published_at.format(DATE_FORMAT).to_string());
            message.push('\n');
        }
        message.push('\n');

        let budget = MAX_MESSAGE_CHARS.saturating_sub(message.chars().count());
        message.push_str(&self.fit_description(&item.description, budget));
        message
    }

    /// Strip everything outside the allow-list from untrusted HTML.
    pub fn sanitize(&self, html: &str) -> String {
        self.sanitizer
            .clean(html)
            .to_string()
            // Telegram only knows a handful of named entities
            .replace("&nbsp;", "&#160;")
            .trim()
            .to_string()
    }

    /// Sanitize `description`, cutting the source until the result fits in
    /// `budget` characters.
    fn fit_description(&self, description: &str, budget: usize) -> String {
        let mut limit = description.chars().count();
        loop {
            let (source, truncated) = truncate_chars(description, limit);
            let mut cleaned = self.sanitize(source);
            if truncated {
                cleaned.push_str(ELLIPSIS);
            }

            let len = cleaned.chars().count();
            if len <= budget || limit == 0 {
                return cleaned;
            }
            limit = (limit.saturating_mul(budget) / len).min(limit - 1);
        }
    }
}

/// Cut `s` to at most `max_chars` characters.
fn truncate_chars(s: &str, max_chars: usize) -> (&str, bool) {
    match s.char_indices().nth(max_chars) {
        None => (s, false),
        Some((idx, _)) => (&s[..idx], true),
    }
}
