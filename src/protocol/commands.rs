//! Module `commands`
//!
//! Defines the commands understood by the upload front end and the
//! structures handlers use to report their outcome.

use tokio::fs::File;

/// Represents a command parsed from a client line.
///
/// Commands that require arguments store them in the variant.
#[derive(Debug, PartialEq)]
pub enum Command {
    QUIT,
    PING,
    /// Upload: the line is followed by exactly `size` raw bytes
    SAVE {
        folder: String,
        size: u64,
        file_name: String,
    },
    GET(String),    // Download a stored file
    STAT(String),   // Size and original name of a stored file
    EXISTS(String), // Existence check
    DEL(String),    // Idempotent delete
    UNKNOWN,        // Unknown or malformed command
}

/// Represents the outcome status of executing a command.
#[derive(Debug, PartialEq)]
pub enum CommandStatus {
    Success,
    Failure(String),
    CloseConnection,
}

/// Payload that follows the reply line.
#[derive(Debug)]
pub enum CommandData {
    /// Stored file to stream back, with the byte count announced in the reply
    Download { file: File, size: u64 },
}

/// Struct encapsulating the full result of a command execution.
#[derive(Debug)]
pub struct CommandResult {
    pub status: CommandStatus,
    pub message: Option<String>,
    pub data: Option<CommandData>,
}

impl CommandResult {
    pub fn success(message: String) -> Self {
        Self {
            status: CommandStatus::Success,
            message: Some(message),
            data: None,
        }
    }

    pub fn failure(reason: impl Into<String>, message: String) -> Self {
        Self {
            status: CommandStatus::Failure(reason.into()),
            message: Some(message),
            data: None,
        }
    }

    pub fn close(message: String) -> Self {
        Self {
            status: CommandStatus::CloseConnection,
            message: Some(message),
            data: None,
        }
    }
}

/// Parses a raw command line received from a client into the `Command` enum.
///
/// Validates required arguments and returns `UNKNOWN` if a known command is misused.
pub fn parse_command(raw: &str) -> Command {
    let trimmed = raw.trim();
    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let cmd = parts.next().unwrap_or("").to_ascii_uppercase();
    let arg = parts.next().unwrap_or("").trim();

    match cmd.as_str() {
        "QUIT" | "Q" => Command::QUIT,
        "PING" => Command::PING,
        "SAVE" => parse_save(arg).unwrap_or(Command::UNKNOWN),
        "GET" if !arg.is_empty() => Command::GET(arg.to_string()),
        "STAT" if !arg.is_empty() => Command::STAT(arg.to_string()),
        "EXISTS" if !arg.is_empty() => Command::EXISTS(arg.to_string()),
        "DEL" if !arg.is_empty() => Command::DEL(arg.to_string()),
        _ => Command::UNKNOWN,
    }
}

/// `SAVE <folder> <size> <file name...>`; the name may contain spaces.
fn parse_save(arg: &str) -> Option<Command> {
    let mut parts = arg.splitn(3, char::is_whitespace);
    let folder = parts.next().filter(|s| !s.is_empty())?;
    let size = parts.next()?.parse::<u64>().ok()?;
    let file_name = parts.next().map(str::trim).filter(|s| !s.is_empty())?;

    Some(Command::SAVE {
        folder: folder.to_string(),
        size,
        file_name: file_name.to_string(),
    })
}
