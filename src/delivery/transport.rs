//! Outbound chat transport.

use std::sync::Arc;

use async_trait::async_trait;

use crate::Result;

/// Sends formatted messages to a chat.
///
/// Any error is a delivery failure for that chat only.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send an HTML-formatted message.
    async fn send_html(&self, chat_id: i64, text: &str) -> Result<()>;
}

#[async_trait]
impl<T: ChatTransport + ?Sized> ChatTransport for Arc<T> {
    async fn send_html(&self, chat_id: i64, text: &str) -> Result<()> {
        (**self).send_html(chat_id, text).await
    }
}
