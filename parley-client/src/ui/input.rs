//! Console input composition and command parsing
//!
//! Lines typed at the console build up a draft. A blank line submits the
//! draft; a line starting with `/` on an empty draft is a command such as
//! `/upload ~/notes.pdf`.

use std::path::PathBuf;

/// Something the user asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputCommand {
    /// Send the composed message (may be blank; the session ignores blanks)
    Submit(String),
    /// Stop waiting for the pending response
    Cancel,
    /// Upload a file
    Upload(PathBuf),
    /// Switch between light and dark theme
    ToggleTheme,
    /// Open the chat channel again after it was lost
    Reconnect,
    /// Show command help
    Help,
    /// Leave the application
    Quit,
}

/// Error parsing a command
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// Just a slash
    Empty,
    /// Command not recognized
    Unknown(String),
    /// Missing file path for /upload
    MissingPath,
    /// Invalid syntax
    InvalidSyntax(String),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::Empty => write!(f, "empty command"),
            ParseError::Unknown(name) => write!(f, "unknown command: /{}", name),
            ParseError::MissingPath => write!(f, "missing file path"),
            ParseError::InvalidSyntax(msg) => write!(f, "invalid syntax: {}", msg),
        }
    }
}

impl std::error::Error for ParseError {}

/// Help text listing the console commands
pub const HELP_TEXT: &str = "\
Type a message and press Enter on an empty line to send it.
Commands (on an empty draft):
  /cancel          stop waiting for the current answer
  /upload <path>   upload a file for processing
  /theme           toggle light and dark theme
  /reconnect       reconnect after the connection was lost
  /help            show this help
  /quit            exit";

/// Builds messages from console lines
#[derive(Debug, Default)]
pub struct Composer {
    lines: Vec<String>,
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a draft is being composed
    pub fn is_drafting(&self) -> bool {
        !self.lines.is_empty()
    }

    /// Current draft, lines joined with newlines
    pub fn draft(&self) -> String {
        self.lines.join("\n")
    }

    /// Feed one console line
    ///
    /// Returns the command the line completes, if any. A parse error leaves
    /// the draft untouched.
    pub fn feed(&mut self, line: &str) -> Result<Option<InputCommand>, ParseError> {
        if line.trim().is_empty() {
            let draft = self.draft();
            self.lines.clear();
            return Ok(Some(InputCommand::Submit(draft)));
        }

        if !self.is_drafting() && is_command(line) {
            return parse_command(line).map(Some);
        }

        self.lines.push(line.to_string());
        Ok(None)
    }
}

/// Parse a command string into an [`InputCommand`]
///
/// # Supported commands
///
/// - `/cancel`
/// - `/upload <path>` (path may be quoted)
/// - `/theme`
/// - `/reconnect`
/// - `/help`
/// - `/quit` (also `/exit`)
pub fn parse_command(input: &str) -> Result<InputCommand, ParseError> {
    let input = input.trim();

    let Some(body) = input.strip_prefix('/') else {
        return Err(ParseError::InvalidSyntax(
            "command must start with /".to_string(),
        ));
    };

    let (name, args) = split_first_token(body);
    let name = name.to_lowercase();

    match name.as_str() {
        "" => Err(ParseError::Empty),
        "cancel" => Ok(InputCommand::Cancel),
        "upload" => parse_upload_args(args),
        "theme" => Ok(InputCommand::ToggleTheme),
        "reconnect" => Ok(InputCommand::Reconnect),
        "help" | "?" => Ok(InputCommand::Help),
        "quit" | "exit" => Ok(InputCommand::Quit),
        _ => Err(ParseError::Unknown(name)),
    }
}

fn parse_upload_args(args: &str) -> Result<InputCommand, ParseError> {
    let args = args.trim();
    if args.is_empty() {
        return Err(ParseError::MissingPath);
    }

    let path = unquote(args)?;
    if path.is_empty() {
        return Err(ParseError::MissingPath);
    }

    Ok(InputCommand::Upload(expand_home(&path)))
}

/// Strip matching single or double quotes
fn unquote(input: &str) -> Result<String, ParseError> {
    for quote in ['"', '\''] {
        if let Some(stripped) = input.strip_prefix(quote) {
            return match stripped.find(quote) {
                Some(end) => Ok(stripped[..end].to_string()),
                None => Err(ParseError::InvalidSyntax("unclosed quote in path".to_string())),
            };
        }
    }
    Ok(input.to_string())
}

fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => match std::env::var_os("HOME") {
            Some(home) => PathBuf::from(home).join(rest),
            None => PathBuf::from(path),
        },
        None => PathBuf::from(path),
    }
}

/// Split the first whitespace-delimited token from a string
fn split_first_token(input: &str) -> (&str, &str) {
    if let Some(pos) = input.find(char::is_whitespace) {
        (&input[..pos], &input[pos..])
    } else {
        (input, "")
    }
}

/// Check if input looks like a command (starts with /)
pub fn is_command(input: &str) -> bool {
    input.trim_start().starts_with('/')
}
