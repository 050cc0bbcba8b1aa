//! Reply handling
//!
//! Defines reply codes and formatting. Error codes follow HTTP semantics so the
//! front end maps onto an HTTP controller one to one.

/// Standard reply codes
pub const OK: u16 = 200;
pub const CREATED: u16 = 201;
pub const DELETED: u16 = 204;
pub const READY: u16 = 220;
pub const GOODBYE: u16 = 221;
pub const BAD_REQUEST: u16 = 400;
pub const PAYLOAD_TOO_LARGE: u16 = 413;
pub const CLOSING: u16 = 421;
pub const UNKNOWN_COMMAND: u16 = 500;

/// Format a reply line
pub fn format_response(code: u16, message: &str) -> String {
    format!("{} {}\r\n", code, message)
}
