//! Logging middleware
//!
//! Provides session and command logging.

use log::{debug, info};
use std::net::SocketAddr;

use crate::client::Client;
use crate::protocol::Command;

/// Log a client connection
pub fn log_connection(client_addr: &SocketAddr, active: usize, max_clients: usize) {
    info!(
        "Client connected: {} ({}/{} clients)",
        client_addr, active, max_clients
    );
}

/// Log a client command. Upload payloads are never logged, only their size.
pub fn log_command(client_addr: &SocketAddr, command: &Command) {
    match command {
        Command::SAVE {
            folder,
            size,
            file_name,
        } => info!(
            "Client {} executed: SAVE {:?} into {:?} ({} bytes)",
            client_addr, file_name, folder, size
        ),
        Command::PING => debug!("Client {} executed: PING", client_addr),
        other => info!("Client {} executed: {:?}", client_addr, other),
    }
}

/// Log the end of a session with its counters
pub fn log_disconnect(client_addr: &SocketAddr, client: Option<&Client>) {
    match client {
        Some(client) => info!(
            "Client {} disconnected after {:.1}s ({} commands, {} uploads, {} downloads)",
            client_addr,
            client.connected_for().as_secs_f64(),
            client.commands(),
            client.uploads(),
            client.downloads()
        ),
        None => info!("Client {} disconnected", client_addr),
    }
}
