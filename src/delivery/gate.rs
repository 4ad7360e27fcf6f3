//! Rate-limited notification dispatch.

use tracing::{debug, warn};

use super::render::MessageRenderer;
use super::throttle::Throttle;
use super::transport::ChatTransport;
use crate::config::DeliveryConfig;
use crate::feed::FeedItem;

/// Outcome of one `send_updates` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Messages accepted by the transport.
    pub sent: usize,
    /// Chats whose delivery was abandoned after an error.
    pub failed: usize,
    /// Throttle pauses taken.
    pub pauses: u64,
}

/// Sends feed updates to subscribers through a [`ChatTransport`].
pub struct DeliveryGate<T> {
    transport: T,
    throttle: Throttle,
    renderer: MessageRenderer,
}

impl<T: ChatTransport> DeliveryGate<T> {
    /// Create a gate with an explicit throttle.
    pub fn new(transport: T, throttle: Throttle) -> Self {
        Self {
            transport,
            throttle,
            renderer: MessageRenderer::new(),
        }
    }

    /// Create a gate from the delivery configuration.
    pub fn from_config(transport: T, config: &DeliveryConfig) -> Self {
        Self::new(transport, Throttle::from_config(config))
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The gate's throttle.
    pub fn throttle(&self) -> &Throttle {
        &self.throttle
    }

    /// Send a header and one message per item to every chat in `chat_ids`.
    ///
    /// A transport error abandons the remaining messages for that chat only.
    /// Every attempt, failed or not, counts toward the throttle.
    pub async fn send_updates(
        &mut self,
        chat_ids: &[i64],
        items: &[FeedItem],
        feed_title: &str,
    ) -> DeliveryReport {
        let mut report = DeliveryReport::default();
        if chat_ids.is_empty() || items.is_empty() {
            return report;
        }

        let mut messages = Vec::with_capacity(items.len() + 1);
        messages.push(self.renderer.header(feed_title));
        messages.extend(items.iter().map(|item| self.renderer.item(item)));

        let pauses_before = self.throttle.pauses();

        for &chat_id in chat_ids {
            for message in &messages {
                let result = self.transport.send_html(chat_id, message).await;
                self.throttle.record().await;

                if let Err(e) = result {
                    warn!("Failed to deliver updates to chat {}: {}", chat_id, e);
                    report.failed += 1;
                    break;
                }
                report.sent += 1;
            }
        }

        report.pauses = self.throttle.pauses() - pauses_before;
        debug!(
            "Delivered {} message(s) to {} chat(s), {} failed",
            report.sent,
            chat_ids.len(),
            report.failed
        );
        report
    }
}
