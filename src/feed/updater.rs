//! Feed update cycle for RSS Bot.
//!
//! One cycle walks every tracked feed in order: fetch, diff against the
//! stored baseline, notify subscribers, then commit the new baseline. Each
//! feed is its own commit boundary, so a failure in one feed never affects
//! the others.

use tracing::{debug, error, info, warn};

use super::diff::diff;
use super::fetcher::FeedSource;
use super::store::ItemStore;
use super::types::{Feed, FeedItem};
use crate::delivery::{ChatTransport, DeliveryGate};
use crate::Result;

/// Summary of one update cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Feeds processed.
    pub feeds: usize,
    /// Feeds skipped because they could not be fetched.
    pub fetch_failures: usize,
    /// Feeds skipped because of a store error.
    pub store_failures: usize,
    /// Feeds without new items.
    pub unchanged: usize,
    /// Feeds whose baseline was replaced.
    pub updated: usize,
    /// New items found across all feeds.
    pub new_items: usize,
    /// Messages accepted by the transport.
    pub messages_sent: usize,
    /// Chats whose delivery was abandoned.
    pub delivery_failures: usize,
}

/// Result of processing a single feed.
enum FeedOutcome {
    Unchanged,
    Updated {
        new_items: usize,
        sent: usize,
        failed: usize,
    },
}

/// Drives update cycles over a store, a feed source and a delivery gate.
pub struct UpdateOrchestrator<'a, S: ?Sized, F: ?Sized, T> {
    store: &'a S,
    fetcher: &'a F,
    gate: DeliveryGate<T>,
}

impl<'a, S, F, T> UpdateOrchestrator<'a, S, F, T>
where
    S: ItemStore + ?Sized,
    F: FeedSource + ?Sized,
    T: ChatTransport,
{
    /// Create a new orchestrator.
    pub fn new(store: &'a S, fetcher: &'a F, gate: DeliveryGate<T>) -> Self {
        Self {
            store,
            fetcher,
            gate,
        }
    }

    /// The delivery gate.
    pub fn gate(&self) -> &DeliveryGate<T> {
        &self.gate
    }

    /// Run one update cycle over all feeds.
    ///
    /// # Errors
    ///
    /// Only a failure to list the feeds aborts the cycle. Per-feed errors are
    /// logged and counted in the report.
    pub async fn run_cycle(&mut self) -> Result<CycleReport> {
        let feeds = self.store.list_feeds().await?;
        let mut report = CycleReport {
            feeds: feeds.len(),
            ..CycleReport::default()
        };

        if feeds.is_empty() {
            debug!("No feeds to update");
            return Ok(report);
        }

        info!("Updating {} feed(s)", feeds.len());

        for feed in &feeds {
            debug!("Updating feed {}: {}", feed.id, feed.url);

            let fetched = match self.fetcher.fetch(&feed.url).await {
                Ok(fetched) => fetched,
                Err(e) => {
                    warn!("Failed to fetch feed {} ({}): {}", feed.id, feed.url, e);
                    report.fetch_failures += 1;
                    continue;
                }
            };

            match self.process_feed(feed, &fetched.title, &fetched.items).await {
                Ok(FeedOutcome::Unchanged) => report.unchanged += 1,
                Ok(FeedOutcome::Updated {
                    new_items,
                    sent,
                    failed,
                }) => {
                    report.updated += 1;
                    report.new_items += new_items;
                    report.messages_sent += sent;
                    report.delivery_failures += failed;
                }
                Err(e) => {
                    error!("Failed to update feed {} ({}): {}", feed.id, feed.url, e);
                    report.store_failures += 1;
                }
            }
        }

        info!(
            "Update cycle finished: {} updated, {} unchanged, {} fetch failure(s), {} store failure(s), {} message(s) sent",
            report.updated,
            report.unchanged,
            report.fetch_failures,
            report.store_failures,
            report.messages_sent
        );

        Ok(report)
    }

    /// Diff, deliver and commit one fetched feed.
    async fn process_feed(
        &mut self,
        feed: &Feed,
        fetched_title: &str,
        items: &[FeedItem],
    ) -> Result<FeedOutcome> {
        let baseline = self.store.get_baseline(feed.id).await?;
        let fresh = diff(items, &baseline);

        if fresh.is_empty() {
            debug!("Feed {} has no new items", feed.id);
            return Ok(FeedOutcome::Unchanged);
        }

        let subscribers = self.store.subscribers(feed.id).await?;

        let title = [fetched_title, feed.title.as_str(), feed.url.as_str()]
            .into_iter()
            .find(|t| !t.is_empty())
            .unwrap_or_default();

        let delivery = self.gate.send_updates(&subscribers, &fresh, title).await;

        // Delivery failures never hold back the commit
        self.store.replace_baseline(feed.id, items).await?;

        // A failed title write leaves the commit standing
        if !fetched_title.is_empty() && fetched_title != feed.title {
            if let Err(e) = self.store.update_title(feed.id, fetched_title).await {
                warn!("Failed to record title of feed {}: {}", feed.id, e);
            }
        }

        info!(
            "Feed {} updated: {} new item(s) for {} subscriber(s)",
            feed.id,
            fresh.len(),
            subscribers.len()
        );

        Ok(FeedOutcome::Updated {
            new_items: fresh.len(),
            sent: delivery.sent,
            failed: delivery.failed,
        })
    }
}
