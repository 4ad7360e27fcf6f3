//! Feed fetcher.
//!
//! Fetches RSS/Atom/JSON feeds over HTTP with bounded timeouts and a size
//! limit, and parses them into [`FetchedFeed`] values. Also provides the URL
//! validation applied when a chat subscribes to a feed.

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use feed_rs::parser;
use reqwest::Client;

use crate::config::FetchConfig;
use crate::feed::types::{FeedItem, FetchedFeed};
use crate::{BotError, Result};

/// User agent string for feed fetching.
const USER_AGENT: &str = concat!("rssbot/", env!("CARGO_PKG_VERSION"));

/// Source of parsed feeds.
///
/// Every error returned by `fetch` is a fetch failure for that one URL.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch and parse the feed at `url`.
    async fn fetch(&self, url: &str) -> Result<FetchedFeed>;
}

/// HTTP feed fetcher.
pub struct HttpFeedFetcher {
    client: Client,
    max_feed_size: u64,
}

impl HttpFeedFetcher {
    /// Create a fetcher with the given limits.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .read_timeout(Duration::from_secs(config.read_timeout_secs))
            .timeout(Duration::from_secs(config.total_timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| BotError::Fetch(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            max_feed_size: config.max_feed_size_bytes,
        })
    }
}

#[async_trait]
impl FeedSource for HttpFeedFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedFeed> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| BotError::Fetch(format!("failed to fetch feed: {}", e)))?;

        if !response.status().is_success() {
            return Err(BotError::Fetch(format!("HTTP error: {}", response.status())));
        }

        if let Some(content_length) = response.content_length() {
            if content_length > self.max_feed_size {
                return Err(BotError::Fetch(format!(
                    "feed too large: {} bytes (max {} bytes)",
                    content_length, self.max_feed_size
                )));
            }
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| BotError::Fetch(format!("failed to read response: {}", e)))?;

        // Content-Length may be absent or wrong
        if bytes.len() as u64 > self.max_feed_size {
            return Err(BotError::Fetch(format!(
                "feed too large: {} bytes (max {} bytes)",
                bytes.len(),
                self.max_feed_size
            )));
        }

        parse_feed(&bytes)
    }
}

/// Parse feed bytes into a [`FetchedFeed`].
///
/// Missing text fields become empty strings; items keep document order.
/// Only an explicit `<guid>`/`<id>` becomes an item's guid.
pub fn parse_feed(bytes: &[u8]) -> Result<FetchedFeed> {
    // The default generator hashes the entry content into an id
    let feed = parser::Builder::new()
        .id_generator(|_, _, _| String::new())
        .build()
        .parse(bytes)
        .map_err(|e| BotError::Fetch(format!("failed to parse feed: {}", e)))?;

    let title = feed.title.map(|t| t.content).unwrap_or_default();

    let items = feed
        .entries
        .into_iter()
        .map(|entry| {
            let url = entry
                .links
                .first()
                .map(|l| l.href.clone())
                .unwrap_or_default();
            let title = entry.title.map(|t| t.content).unwrap_or_default();
            let description = entry
                .summary
                .map(|t| t.content)
                .or(entry.content.and_then(|c| c.body))
                .unwrap_or_default();
            let published_at = entry.published.or(entry.updated);

            FeedItem {
                url,
                title,
                description,
                guid: Some(entry.id).filter(|id| !id.is_empty()),
                published_at,
            }
        })
        .collect();

    Ok(FetchedFeed { title, items })
}

/// Hostname suffixes that only resolve inside private networks.
const INTERNAL_SUFFIXES: [&str; 7] = [
    ".local",
    ".localhost",
    ".internal",
    ".intranet",
    ".corp",
    ".home",
    ".lan",
];

/// Check a feed URL submitted from a chat.
///
/// Only absolute http(s) URLs pointing at a public host are accepted.
pub fn validate_url(url: &str) -> Result<()> {
    let parsed =
        url::Url::parse(url).map_err(|e| BotError::Validation(format!("invalid URL: {}", e)))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(BotError::Validation(format!(
            "unsupported URL scheme: {}",
            parsed.scheme()
        )));
    }

    let ip = match parsed.host() {
        None => return Err(BotError::Validation("URL has no host".to_string())),
        Some(url::Host::Domain(domain)) if is_forbidden_hostname(domain) => {
            return Err(BotError::Validation(format!("forbidden host: {}", domain)));
        }
        Some(url::Host::Domain(_)) => return Ok(()),
        Some(url::Host::Ipv4(v4)) => IpAddr::V4(v4),
        Some(url::Host::Ipv6(v6)) => IpAddr::V6(v6),
    };

    if is_private_ip(&ip) {
        return Err(BotError::Validation(format!(
            "private IP address not allowed: {}",
            ip
        )));
    }
    Ok(())
}

fn is_forbidden_hostname(host: &str) -> bool {
    let host = host.to_ascii_lowercase();
    host == "localhost" || INTERNAL_SUFFIXES.iter().any(|suffix| host.ends_with(suffix))
}

/// Loopback, private, link-local, unspecified, broadcast and documentation
/// ranges.
fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            let [a, b, c, _] = v4.octets();
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_broadcast()
                || v4.is_unspecified()
                || matches!((a, b, c), (192, 0, 2) | (198, 51, 100) | (203, 0, 113))
        }
        IpAddr::V6(v6) => {
            let first = v6.segments()[0];
            // fc00::/7 unique local, fe80::/10 link-local
            v6.is_loopback()
                || v6.is_unspecified()
                || (first & 0xfe00) == 0xfc00
                || (first & 0xffc0) == 0xfe80
        }
    }
}
