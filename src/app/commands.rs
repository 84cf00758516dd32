//! Commands accepted at the interactive prompt.

use std::fmt;
use std::str::FromStr;

/// A REPL command. Input is matched case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Process a mailbox archive into the current namespace.
    NewInbox,
    /// Dump every stored row in insertion order.
    ShowEmails,
    /// Dump stored rows, most urgent first.
    ShowUrgent,
    /// Print the four vocabulary lists.
    ShowVocab,
    /// Drop both namespace tables.
    Reset,
    /// Store an API key in the OS keychain.
    SetKey,
    Help,
    Quit,
    /// Anything else, uppercased.
    Unknown(String),
}

impl Command {
    pub const ALL: [Command; 8] = [
        Command::NewInbox,
        Command::ShowEmails,
        Command::ShowUrgent,
        Command::ShowVocab,
        Command::Reset,
        Command::SetKey,
        Command::Help,
        Command::Quit,
    ];

    /// Parses one input line; blank lines yield `None`.
    pub fn parse(line: &str) -> Option<Self> {
        let word = line.trim().to_uppercase();
        if word.is_empty() {
            return None;
        }

        Some(match word.as_str() {
            "NEW_INBOX" => Command::NewInbox,
            "SHOW_EMAILS" => Command::ShowEmails,
            "SHOW_URGENT" => Command::ShowUrgent,
            "SHOW_VOCAB" => Command::ShowVocab,
            "RESET" => Command::Reset,
            "SET_KEY" => Command::SetKey,
            "HELP" => Command::Help,
            "QUIT" | "EXIT" => Command::Quit,
            _ => Command::Unknown(word),
        })
    }

    pub fn description(&self) -> &'static str {
        match self {
            Command::NewInbox => "classify a mailbox archive and store the results",
            Command::ShowEmails => "list stored messages in the order they were added",
            Command::ShowUrgent => "list stored messages, most urgent first",
            Command::ShowVocab => "show known senders and the type, want and alert lists",
            Command::Reset => "drop this namespace's tables",
            Command::SetKey => "save the model API key in the OS keychain",
            Command::Help => "show this list",
            Command::Quit => "leave",
            Command::Unknown(_) => "",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Command::NewInbox => "NEW_INBOX",
            Command::ShowEmails => "SHOW_EMAILS",
            Command::ShowUrgent => "SHOW_URGENT",
            Command::ShowVocab => "SHOW_VOCAB",
            Command::Reset => "RESET",
            Command::SetKey => "SET_KEY",
            Command::Help => "HELP",
            Command::Quit => "QUIT",
            Command::Unknown(word) => word,
        };
        f.write_str(name)
    }
}

/// How many messages of an archive to process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageLimit(pub Option<usize>);

impl FromStr for MessageLimit {
    type Err = String;

    /// Accepts `all` (any case, also an empty answer) or a non-negative
    /// integer.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            return Ok(MessageLimit(None));
        }
        s.parse::<usize>()
            .map(|n| MessageLimit(Some(n)))
            .map_err(|_| format!("expected 'all' or a number, got {:?}", s))
    }
}
