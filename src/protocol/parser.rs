//! Command parsing
//!
//! Handles parsing of commands from client input.

/// Parse a command line into a Command enum
/// This is the main parsing function exported from commands.rs
pub use crate::protocol::commands::parse_command;
