//! Long-polling command loop.

use std::time::Duration;

use tracing::{debug, error, info, warn};

use super::handler::CommandHandler;
use crate::db::Database;
use crate::telegram::{TelegramClient, Update, UpdateContent};
use crate::Result;

/// Delay before polling again after a failed `getUpdates`.
const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Receives chat messages and answers them.
pub struct BotRunner {
    client: TelegramClient,
    db: Database,
    poll_timeout_secs: u64,
    offset: i64,
}

impl BotRunner {
    /// Create a new runner.
    pub fn new(client: TelegramClient, db: Database, poll_timeout_secs: u64) -> Self {
        Self {
            client,
            db,
            poll_timeout_secs,
            offset: 0,
        }
    }

    /// Offset of the next update to request.
    pub fn offset(&self) -> i64 {
        self.offset
    }

    /// Poll and answer messages until Ctrl-C is received.
    pub async fn run(&mut self) -> Result<()> {
        info!("Bot started, waiting for messages");

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown signal received, stopping bot");
                    return Ok(());
                }
                result = self.poll_once() => {
                    if let Err(e) = result {
                        warn!("Failed to fetch updates: {}", e);
                        tokio::time::sleep(RETRY_DELAY).await;
                    }
                }
            }
        }
    }

    /// Fetch one batch of updates and answer every message in it.
    ///
    /// Returns the number of updates processed.
    pub async fn poll_once(&mut self) -> Result<usize> {
        let updates = self
            .client
            .get_updates(self.offset, self.poll_timeout_secs)
            .await?;

        for update in &updates {
            // Acknowledge before handling so a bad update is never redelivered
            self.offset = self.offset.max(i64::from(update.update_id) + 1);
            self.handle_update(update).await;
        }

        Ok(updates.len())
    }

    async fn handle_update(&self, update: &Update) {
        let UpdateContent::Message(message) = &update.content else {
            debug!("Ignoring update {} without a message", update.update_id);
            return;
        };
        let Some(text) = message.text.as_deref() else {
            debug!("Ignoring non-text message {}", message.message_id);
            return;
        };

        let chat_id = message.chat.id;
        let reply = CommandHandler::new(&self.db).handle(chat_id, text).await;

        if let Err(e) = self
            .client
            .send_message(chat_id, &reply, None, Some(message.message_id))
            .await
        {
            error!("Failed to reply to chat {}: {}", chat_id, e);
        }
    }
}
