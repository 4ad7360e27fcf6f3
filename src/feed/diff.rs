//! New-item detection.
//!
//! Compares a freshly fetched item list against the baseline stored for a
//! feed and returns the items that were not delivered before.

use std::collections::HashSet;

use tracing::debug;

use crate::feed::types::{BaselineEntry, FeedItem};

/// Return the items of `new_items` that are not part of `baseline`.
///
/// Rules:
/// - An empty baseline reports every item as new.
/// - If the baseline holds at least one guid, items carrying a guid are
///   matched by guid only. Items without a guid, and every item when the
///   baseline holds no guid at all, are matched by URL.
///
/// The result keeps the input order, and duplicates within `new_items` are
/// not collapsed.
pub fn diff(new_items: &[FeedItem], baseline: &[BaselineEntry]) -> Vec<FeedItem> {
    if baseline.is_empty() {
        debug!("Baseline is empty, all {} item(s) are new", new_items.len());
        return new_items.to_vec();
    }

    let guids: HashSet<&str> = baseline
        .iter()
        .filter_map(|entry| entry.guid.as_deref())
        .filter(|guid| !guid.is_empty())
        .collect();
    let urls: HashSet<&str> = baseline.iter().map(|entry| entry.url.as_str()).collect();

    debug!(
        "Comparing {} item(s) with a baseline of {} ({} guid(s))",
        new_items.len(),
        baseline.len(),
        guids.len()
    );

    let fresh: Vec<FeedItem> = new_items
        .iter()
        .filter(|item| match item.guid() {
            Some(guid) if !guids.is_empty() => !guids.contains(guid),
            _ => !urls.contains(item.url.as_str()),
        })
        .cloned()
        .collect();

    debug!("{} new item(s) found", fresh.len());
    fresh
}
