//! Error types for RSS Bot.

use thiserror::Error;

/// Common error type for RSS Bot.
#[derive(Error, Debug)]
pub enum BotError {
    /// Database error.
    ///
    /// Errors from sqlx are converted into this variant.
    #[error("database error: {0}")]
    Database(String),

    /// Database connection error.
    #[error("database connection error: {0}")]
    DatabaseConnection(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// A feed could not be fetched or parsed.
    #[error("feed fetch failed: {0}")]
    Fetch(String),

    /// Telegram Bot API or transport error.
    #[error("telegram error: {0}")]
    Telegram(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<sqlx::Error> for BotError {
    fn from(e: sqlx::Error) -> Self {
        BotError::Database(e.to_string())
    }
}

/// Result type alias for RSS Bot operations.
pub type Result<T> = std::result::Result<T, BotError>;

/// Error returned by operations triggered from a chat command.
///
/// `Displayable` messages are shown to the user verbatim. `Internal` errors
/// are logged and replaced with a generic reply.
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("{0}")]
    Displayable(String),

    #[error(transparent)]
    Internal(#[from] BotError),
}

impl From<sqlx::Error> for CommandError {
    fn from(e: sqlx::Error) -> Self {
        CommandError::Internal(e.into())
    }
}

impl CommandError {
    /// Shorthand for a user-facing error.
    pub fn displayable(message: impl Into<String>) -> Self {
        CommandError::Displayable(message.into())
    }

    /// Whether the message may be shown to the user.
    pub fn is_displayable(&self) -> bool {
        matches!(self, CommandError::Displayable(_))
    }
}
