//! Server core functionality
//!
//! This module contains the listener and accept loop for the upload server.

pub mod core;

pub use self::core::Server;
