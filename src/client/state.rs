//! Module `state`
//!
//! Defines the `Client` struct tracking one connected session: where it
//! came from, when, and what it has transferred.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// Represents the state of a connected client session.
#[derive(Debug)]
pub struct Client {
    client_addr: SocketAddr,
    connected_at: Instant,
    commands: u64,
    uploads: u64,
    downloads: u64,
}

impl Client {
    pub fn new(client_addr: SocketAddr) -> Self {
        Self {
            client_addr,
            connected_at: Instant::now(),
            commands: 0,
            uploads: 0,
            downloads: 0,
        }
    }

    // --------------------
    // Getter methods
    // --------------------

    /// Returns the client's socket address.
    pub fn client_addr(&self) -> SocketAddr {
        self.client_addr
    }

    /// Time since the session was accepted.
    pub fn connected_for(&self) -> Duration {
        self.connected_at.elapsed()
    }

    pub fn commands(&self) -> u64 {
        self.commands
    }

    pub fn uploads(&self) -> u64 {
        self.uploads
    }

    pub fn downloads(&self) -> u64 {
        self.downloads
    }

    // --------------------
    // Counters
    // --------------------

    pub fn record_command(&mut self) {
        self.commands += 1;
    }

    pub fn record_upload(&mut self) {
        self.uploads += 1;
    }

    pub fn record_download(&mut self) {
        self.downloads += 1;
    }
}
