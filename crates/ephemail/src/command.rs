//! User commands typed into the terminal.

use ephemail_core::ViewMode;

/// A command entered on stdin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserCommand {
    /// Switch the view mode.
    View(ViewMode),
    /// Copy the current content.
    Copy,
    /// Close the viewer.
    Close,
    /// Show the command list again.
    Help,
}

impl UserCommand {
    /// Parses one input line. Blank or unknown input yields `None`.
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            "1" | "html" => Some(Self::View(ViewMode::Rendered)),
            "2" | "text" => Some(Self::View(ViewMode::PlainText)),
            "3" | "raw" => Some(Self::View(ViewMode::Raw)),
            "c" | "copy" => Some(Self::Copy),
            "q" | "close" | "quit" => Some(Self::Close),
            "?" | "h" | "help" => Some(Self::Help),
            _ => None,
        }
    }
}

/// One-line summary of the accepted commands.
pub const HELP: &str = "[1] html  [2] text  [3] raw  [c] copy  [q] close  [?] help";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(UserCommand::parse("1"), Some(UserCommand::View(ViewMode::Rendered)));
        assert_eq!(UserCommand::parse(" TEXT \n"), Some(UserCommand::View(ViewMode::PlainText)));
        assert_eq!(UserCommand::parse("raw"), Some(UserCommand::View(ViewMode::Raw)));
        assert_eq!(UserCommand::parse("c"), Some(UserCommand::Copy));
        assert_eq!(UserCommand::parse("q"), Some(UserCommand::Close));
        assert_eq!(UserCommand::parse(""), None);
        assert_eq!(UserCommand::parse("delete"), None);
    }
}
