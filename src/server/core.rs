use log::{error, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;

use crate::client::{Client, ClientRegistry, SharedClientRegistry, handle_client};
use crate::config::{AppConfig, ServerSettings, SharedRuntimeLimits};
use crate::error::ServerError;
use crate::middleware::logging::log_connection;
use crate::protocol::responses::{self, format_response};
use crate::storage::FileStorageService;

pub struct Server {
    client_registry: SharedClientRegistry,
    listener: TcpListener,
    service: Arc<FileStorageService>,
    settings: Arc<ServerSettings>,
    limits: SharedRuntimeLimits,
}

impl Server {
    /// Bind the listener and prepare the storage root.
    pub async fn bind(config: AppConfig) -> Result<Self, ServerError> {
        let (settings, storage, limits) = config.split();

        let service = FileStorageService::new(&storage, Arc::clone(&limits));
        service.ensure_root().await?;
        info!("Storage root directory: {}", service.root().display());

        let socket = settings.listen_socket();
        let listener = match TcpListener::bind(&socket).await {
            Ok(listener) => {
                info!("Server bound to {}", socket);
                listener
            }
            Err(e) => {
                error!("Failed to bind to {}: {}", socket, e);
                return Err(e.into());
            }
        };

        Ok(Self {
            client_registry: Arc::new(Mutex::new(ClientRegistry::new())),
            listener,
            service: Arc::new(service),
            settings: Arc::new(settings),
            limits,
        })
    }

    /// Address the listener actually bound to (useful with port 0)
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept clients forever, one task per session.
    pub async fn run(&self) {
        info!(
            "Starting upload server on {} (max {} clients)",
            self.settings.listen_socket(),
            self.limits.read().await.max_clients
        );

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let client_registry = Arc::clone(&self.client_registry);
                    let service = Arc::clone(&self.service);
                    let settings = Arc::clone(&self.settings);
                    let limits = Arc::clone(&self.limits);

                    // Spawn a task for each client so accept loop doesn't block
                    tokio::spawn(async move {
                        if let Err(e) =
                            handle_new_client(stream, addr, client_registry, service, settings, limits)
                                .await
                        {
                            warn!("Failed to handle client {}: {}", addr, e);
                        }
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                }
            }
        }
    }
}

/// Handles a new client: greets, registers, and hands off to the session handler.
async fn handle_new_client(
    mut stream: TcpStream,
    client_addr: SocketAddr,
    client_registry: SharedClientRegistry,
    service: Arc<FileStorageService>,
    settings: Arc<ServerSettings>,
    limits: SharedRuntimeLimits,
) -> Result<(), std::io::Error> {
    let max_clients = limits.read().await.max_clients;

    let mut clients = client_registry.lock().await;
    if !clients.try_register(Client::new(client_addr), max_clients) {
        drop(clients);
        warn!("Rejecting {}: {} clients already connected", client_addr, max_clients);
        let reply = format_response(responses::CLOSING, "Too many connections. Try again later.");
        stream.write_all(reply.as_bytes()).await?;
        return Ok(()); // Close connection
    }
    log_connection(&client_addr, clients.len(), max_clients);
    drop(clients);

    let greeting = format_response(responses::READY, "unidir-files ready");
    if let Err(e) = stream.write_all(greeting.as_bytes()).await {
        client_registry.lock().await.remove(&client_addr);
        return Err(e);
    }

    handle_client(stream, client_addr, client_registry, service, settings, limits).await;

    Ok(())
}
