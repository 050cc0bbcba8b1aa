use log::{error, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{self, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use crate::client::SharedClientRegistry;
use crate::client::idle::{IdleTimeout, is_idle_timeout};
use crate::config::{ServerSettings, SharedRuntimeLimits};
use crate::middleware::logging::{log_command, log_disconnect};
use crate::protocol::responses::{self, format_response};
use crate::protocol::{Command, CommandData, CommandResult, CommandStatus, handle_command, parse_command};
use crate::storage::FileStorageService;

/// Handles a client session using the Tokio async runtime.
///
/// - Uses BufReader to read command lines; upload payloads come from the same reader.
/// - Every read is bounded by the idle timeout, so a stalled peer frees its slot.
/// - Dispatches commands using `handle_command`.
/// - Updates the session's counters in the shared registry and removes it on exit.
pub async fn handle_client(
    stream: TcpStream,
    client_addr: SocketAddr,
    clients: SharedClientRegistry,
    service: Arc<FileStorageService>,
    settings: Arc<ServerSettings>,
    limits: SharedRuntimeLimits,
) {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(IdleTimeout::new(read_half, settings.connection_timeout()));
    let mut line = String::new();

    loop {
        line.clear();

        match reader.read_line(&mut line).await {
            Err(e) if is_idle_timeout(&e) => {
                info!("Client {} idle for {:?}, closing", client_addr, settings.connection_timeout());
                let reply = format_response(responses::CLOSING, "Idle timeout");
                let _ = write_half.write_all(reply.as_bytes()).await;
                break;
            }
            Ok(0) => {
                // Client closed the connection
                info!("Connection closed by client {}", client_addr);
                break;
            }
            Ok(_) => {
                // Enforce command length limit
                if line.len() > settings.max_command_length {
                    let reply = format_response(responses::UNKNOWN_COMMAND, "Command too long");
                    if write_half.write_all(reply.as_bytes()).await.is_err() {
                        break;
                    }
                    continue;
                }

                let command = parse_command(&line);
                log_command(&client_addr, &command);

                let result = handle_command(&command, &mut reader, &service, &limits).await;
                record(&clients, &client_addr, &command, &result).await;

                match respond(&mut write_half, result).await {
                    Ok(true) => {}
                    Ok(false) => {
                        info!("Client {} requested to quit", client_addr);
                        break;
                    }
                    Err(e) => {
                        warn!("Failed to reply to {}: {}", client_addr, e);
                        break;
                    }
                }
            }
            Err(e) => {
                error!("Failed to read from {}: {}", client_addr, e);
                break;
            }
        }
    }

    let _ = write_half.shutdown().await;

    let mut clients_guard = clients.lock().await;
    let client = clients_guard.remove(&client_addr);
    log_disconnect(&client_addr, client.as_ref());
}

/// Write the reply line and any payload. Returns false when the session should end.
async fn respond<W>(writer: &mut W, result: CommandResult) -> io::Result<bool>
where
    W: AsyncWrite + Unpin,
{
    if let Some(msg) = &result.message {
        writer.write_all(msg.as_bytes()).await?;
    }

    if let Some(CommandData::Download { file, size }) = result.data {
        let sent = io::copy(&mut file.take(size), writer).await?;
        if sent != size {
            // File shrank under us; the peer cannot resynchronise
            error!("Download sent {} of {} announced bytes", sent, size);
            writer.flush().await?;
            return Ok(false);
        }
    }

    writer.flush().await?;
    Ok(result.status != CommandStatus::CloseConnection)
}

async fn record(
    clients: &SharedClientRegistry,
    client_addr: &SocketAddr,
    command: &Command,
    result: &CommandResult,
) {
    let mut clients_guard = clients.lock().await;
    let Some(client) = clients_guard.get_mut(client_addr) else {
        return;
    };

    client.record_command();
    if result.status == CommandStatus::Success {
        match command {
            Command::SAVE { .. } => client.record_upload(),
            Command::GET(_) => client.record_download(),
            _ => {}
        }
    }
}
