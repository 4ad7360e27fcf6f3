//! Chat command parsing.

/// A command sent to the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/add <feed url>`
    Add(Option<String>),
    /// `/list`
    List,
    /// `/del <feed url>`
    Del(Option<String>),
    /// `/help`, `/start`, and anything unrecognized.
    Help,
}

impl Command {
    /// Parse the text of a message.
    ///
    /// Commands may be addressed to a bot (`/add@my_bot url`). The first
    /// argument is kept; any further arguments are ignored.
    pub fn parse(text: &str) -> Self {
        let mut parts = text.split_whitespace();
        let Some(head) = parts.next() else {
            return Command::Help;
        };
        let Some(name) = head.strip_prefix('/') else {
            return Command::Help;
        };
        let name = name.split('@').next().unwrap_or_default();
        let argument = parts.next().map(str::to_string);

        match name {
            "add" => Command::Add(argument),
            "list" => Command::List,
            "del" => Command::Del(argument),
            _ => Command::Help,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_add() {
        assert_eq!(
            Command::parse("/add https://example.com/feed.xml"),
            Command::Add(Some("https://example.com/feed.xml".to_string()))
        );
        assert_eq!(Command::parse("/add"), Command::Add(None));
        assert_eq!(Command::parse("/add   "), Command::Add(None));
    }

    #[test]
    fn test_parse_extra_arguments_ignored() {
        assert_eq!(
            Command::parse("/del  https://a.example/  https://b.example/"),
            Command::Del(Some("https://a.example/".to_string()))
        );
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(Command::parse("/list"), Command::List);
        assert_eq!(Command::parse("  /list  "), Command::List);
    }

    #[test]
    fn test_parse_bot_mention() {
        assert_eq!(Command::parse("/list@rss_bot"), Command::List);
        assert_eq!(
            Command::parse("/add@rss_bot https://example.com/"),
            Command::Add(Some("https://example.com/".to_string()))
        );
    }

    #[test]
    fn test_parse_help_and_fallback() {
        assert_eq!(Command::parse("/help"), Command::Help);
        assert_eq!(Command::parse("/start"), Command::Help);
        assert_eq!(Command::parse("/unknown"), Command::Help);
        assert_eq!(Command::parse("hello there"), Command::Help);
        assert_eq!(Command::parse(""), Command::Help);
        assert_eq!(Command::parse("add https://example.com/"), Command::Help);
    }
}
