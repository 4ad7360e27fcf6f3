//! Chat command handling.

use tracing::{debug, error};

use super::command::Command;
use crate::db::{Database, UserRepository};
use crate::feed::SubscriptionService;
use crate::{CommandError, Result};

/// Reply to `/help`, `/start` and unrecognized messages.
pub const HELP_TEXT: &str = "Supported commands:\n  \
                             /add <feed url> - Add new feed\n  \
                             /list - List currently added feeds\n  \
                             /del <feed url> - Remove feed\n  \
                             /help - Get this help message";

/// Reply to any internal failure.
pub const GENERIC_ERROR: &str = "Something went wrong. Please try again (maybe later).";

/// The user a command is executed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandContext {
    /// Internal user ID.
    pub user_id: i64,
}

/// Executes chat commands against the database.
pub struct CommandHandler<'a> {
    db: &'a Database,
}

impl<'a> CommandHandler<'a> {
    /// Create a new handler.
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Resolve the user behind `chat_id`, registering it on first contact.
    pub async fn context(&self, chat_id: i64) -> Result<CommandContext> {
        let user_id = UserRepository::new(self.db.pool())
            .find_or_register(chat_id)
            .await?;
        Ok(CommandContext { user_id })
    }

    /// Handle a message from `chat_id` and return the reply text.
    pub async fn handle(&self, chat_id: i64, text: &str) -> String {
        let command = Command::parse(text);
        debug!("Chat {} sent {:?}", chat_id, command);

        let result = match self.context(chat_id).await {
            Ok(ctx) => self.execute(&ctx, command).await,
            Err(e) => Err(CommandError::Internal(e)),
        };

        match result {
            Ok(reply) => reply,
            Err(e) => {
                if !e.is_displayable() {
                    error!("Command from chat {} failed: {}", chat_id, e);
                }
                error_reply(&e)
            }
        }
    }

    /// Execute a parsed command.
    pub async fn execute(
        &self,
        ctx: &CommandContext,
        command: Command,
    ) -> std::result::Result<String, CommandError> {
        let service = SubscriptionService::new(self.db);

        match command {
            Command::Add(url) => {
                let url = require_url(url)?;
                service.subscribe(ctx.user_id, &url).await?;
                Ok("Successfully subscribed to feed.".to_string())
            }
            Command::List => {
                let feeds = service.list_feeds_for(ctx.user_id).await?;
                let mut reply = String::from("Your feeds:\n");
                for feed in feeds {
                    reply.push_str(&format!("* {}: {}\n", feed.id, feed.url));
                }
                Ok(reply)
            }
            Command::Del(url) => {
                let url = require_url(url)?;
                service.unsubscribe(ctx.user_id, &url).await?;
                Ok("Unsubscribed.".to_string())
            }
            Command::Help => Ok(HELP_TEXT.to_string()),
        }
    }
}

/// Text shown to the user for a failed command.
pub fn error_reply(error: &CommandError) -> String {
    match error {
        CommandError::Displayable(message) => format!("Error: {}", message),
        CommandError::Internal(_) => GENERIC_ERROR.to_string(),
    }
}

fn require_url(url: Option<String>) -> std::result::Result<String, CommandError> {
    url.ok_or_else(|| CommandError::displayable("Feed URL should be specified"))
}
