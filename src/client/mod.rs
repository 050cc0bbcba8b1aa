//! Client management system
//!
//! Handles client sessions, their state and the registry of active sessions.

pub mod handler;
pub mod idle;
pub mod registry;
pub mod state;

pub use handler::handle_client;
pub use registry::{ClientRegistry, SharedClientRegistry};
pub use state::Client;
