//! Telegram Bot API client.

use std::fmt::Debug;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use frankenstein::{
    AllowedUpdate, AsyncApi, AsyncTelegramApi, GetUpdatesParams, Message, ParseMode,
    ReplyParameters, SendMessageParams, Update, User,
};
use tracing::debug;

use crate::config::TelegramConfig;
use crate::delivery::ChatTransport;
use crate::{BotError, Result};

/// Bot API client on top of `frankenstein`'s async API.
#[derive(Clone)]
pub struct TelegramClient {
    api: AsyncApi,
    token: String,
    request_timeout: Duration,
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The API URL embeds the token
        f.debug_struct("TelegramClient")
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

impl TelegramClient {
    /// Create a client for the configured API endpoint and token.
    pub fn new(config: &TelegramConfig) -> Result<Self> {
        if config.token.trim().is_empty() {
            return Err(BotError::Config("Telegram bot token is empty".to_string()));
        }

        Ok(Self {
            api: AsyncApi::new_url(api_url(config)),
            token: config.token.clone(),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        })
    }

    /// Call `getMe`.
    pub async fn get_me(&self) -> Result<User> {
        self.call("getMe", self.request_timeout, self.api.get_me())
            .await
    }

    /// Send a text message, optionally formatted and as a reply.
    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        parse_mode: Option<ParseMode>,
        reply_to: Option<i32>,
    ) -> Result<Message> {
        let mut params = SendMessageParams::builder()
            .chat_id(chat_id)
            .text(text)
            .build();
        params.parse_mode = parse_mode;

        if let Some(message_id) = reply_to {
            params.reply_parameters = Some(ReplyParameters::builder().message_id(message_id).build());
        }

        self.call("sendMessage", self.request_timeout, self.api.send_message(&params))
            .await
    }

    /// Long-poll for message updates starting at `offset`.
    pub async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>> {
        let params = GetUpdatesParams::builder()
            .offset(offset)
            .timeout(u32::try_from(timeout_secs).unwrap_or(u32::MAX))
            .allowed_updates(vec![AllowedUpdate::Message])
            .build();

        // The server may hold the request for the whole poll timeout
        let timeout = self.request_timeout + Duration::from_secs(timeout_secs);
        self.call("getUpdates", timeout, self.api.get_updates(&params))
            .await
    }

    async fn call<R, E, Fut>(&self, method: &str, timeout: Duration, request: Fut) -> Result<R>
    where
        E: Debug,
        Fut: Future<Output = std::result::Result<frankenstein::MethodResponse<R>, E>>,
    {
        debug!("Calling Bot API method {}", method);

        match tokio::time::timeout(timeout, request).await {
            Ok(Ok(response)) => Ok(response.result),
            Ok(Err(e)) => Err(BotError::Telegram(format!(
                "{} failed: {}",
                method,
                self.redact(&format!("{:?}", e))
            ))),
            Err(_) => Err(BotError::Telegram(format!(
                "{} timed out after {:?}",
                method, timeout
            ))),
        }
    }

    /// Strip the token from error text, which may quote the request URL.
    fn redact(&self, text: &str) -> String {
        text.replace(&self.token, "<token>")
    }
}

/// `{api_url}/bot{token}`, the prefix every method name is appended to.
fn api_url(config: &TelegramConfig) -> String {
    format!(
        "{}/bot{}",
        config.api_url.trim_end_matches('/'),
        config.token
    )
}

#[async_trait]
impl ChatTransport for TelegramClient {
    async fn send_html(&self, chat_id: i64, text: &str) -> Result<()> {
        self.send_message(chat_id, text, Some(ParseMode::Html), None)
            .await?;
        Ok(())
    }
}
