//! Chat command interface.
//!
//! Users manage their subscriptions by messaging the bot:
//!
//! ```text
//! /add <feed url>   subscribe
//! /list             list subscriptions
//! /del <feed url>   unsubscribe
//! /help             show help (also /start)
//! ```

pub mod command;
pub mod handler;
pub mod runner;

pub use command::Command;
pub use handler::{error_reply, CommandContext, CommandHandler, GENERIC_ERROR, HELP_TEXT};
pub use runner::BotRunner;
