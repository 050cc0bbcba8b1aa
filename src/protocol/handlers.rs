//! Command handlers module.
//!
//! This module defines one handler per command. Handlers forward to the
//! storage service and turn its typed errors into reply lines.

use log::{info, warn};
use tokio::io::{self, AsyncRead, AsyncReadExt};

use crate::client::idle::is_idle_timeout;
use crate::config::SharedRuntimeLimits;
use crate::error::StorageError;
use crate::error::handlers::storage_error_reply;
use crate::protocol::responses::{self, format_response};
use crate::protocol::{Command, CommandData, CommandResult};
use crate::storage::FileStorageService;

/// Dispatches a received command to its corresponding handler.
///
/// # Arguments
///
/// * `command` - Reference to the parsed command.
/// * `body` - The connection's read side; `SAVE` consumes its payload from here.
/// * `service` - The storage service shared by all sessions.
/// * `limits` - Runtime limits, consulted for the upload size cap.
///
/// # Returns
///
/// * `CommandResult` - Result of the command execution, including status and message.
pub async fn handle_command<R>(
    command: &Command,
    body: &mut R,
    service: &FileStorageService,
    limits: &SharedRuntimeLimits,
) -> CommandResult
where
    R: AsyncRead + Unpin,
{
    match command {
        Command::QUIT => handle_cmd_quit(),
        Command::PING => handle_cmd_ping(),
        Command::SAVE {
            folder,
            size,
            file_name,
        } => handle_cmd_save(body, folder, *size, file_name, service, limits).await,
        Command::GET(path) => handle_cmd_get(path, service).await,
        Command::STAT(path) => handle_cmd_stat(path, service).await,
        Command::EXISTS(path) => handle_cmd_exists(path, service).await,
        Command::DEL(path) => handle_cmd_del(path, service).await,
        Command::UNKNOWN => handle_cmd_unknown(),
    }
}

/// Handles the QUIT command: signals connection close.
fn handle_cmd_quit() -> CommandResult {
    CommandResult::close(format_response(responses::GOODBYE, "Goodbye"))
}

fn handle_cmd_ping() -> CommandResult {
    CommandResult::success(format_response(responses::OK, "PONG"))
}

/// Handles the SAVE command: reads exactly `size` payload bytes and stores them.
///
/// The payload is always consumed in full, even when the store rejects it,
/// so the next command line starts at the right byte. A declared size over
/// the upload limit cannot be skipped cheaply and closes the connection.
async fn handle_cmd_save<R>(
    body: &mut R,
    folder: &str,
    size: u64,
    file_name: &str,
    service: &FileStorageService,
    limits: &SharedRuntimeLimits,
) -> CommandResult
where
    R: AsyncRead + Unpin,
{
    let limit = limits.read().await.max_file_size_bytes();
    if size > limit {
        warn!("Refusing upload of {} bytes (limit {})", size, limit);
        return CommandResult::close(format_response(
            responses::PAYLOAD_TOO_LARGE,
            "File too large",
        ));
    }

    let mut payload = (&mut *body).take(size);
    let saved = service.save_file(&mut payload, file_name, folder).await;

    if let Err(StorageError::Io(e)) = &saved {
        if is_idle_timeout(e) {
            warn!("Upload of {:?} stalled: {}", file_name, e);
            return idle_close();
        }
    }

    // Skip whatever the store did not read (rejected name, empty check)
    if let Err(e) = io::copy(&mut payload, &mut io::sink()).await {
        warn!("Failed to drain upload payload: {}", e);
        if is_idle_timeout(&e) {
            return idle_close();
        }
        return CommandResult::close(format_response(
            responses::BAD_REQUEST,
            "Incomplete upload",
        ));
    }

    if payload.limit() > 0 {
        // Peer hung up mid-payload; do not keep a truncated file
        if let Ok(descriptor) = &saved {
            let _ = service.delete_file(&descriptor.relative_path).await;
        }
        warn!(
            "Upload of {:?} ended {} bytes short",
            file_name,
            payload.limit()
        );
        return CommandResult::close(format_response(
            responses::BAD_REQUEST,
            "Incomplete upload",
        ));
    }

    match saved {
        Ok(descriptor) => CommandResult::success(format_response(
            responses::CREATED,
            &descriptor.relative_path,
        )),
        Err(e) => storage_failure(e),
    }
}

/// Handles the GET command: announces size and name, then hands the open file back.
async fn handle_cmd_get(path: &str, service: &FileStorageService) -> CommandResult {
    let meta = match service.stat_file(path).await {
        Ok(meta) => meta,
        Err(e) => return storage_failure(e),
    };

    match service.get_file(path).await {
        Ok(file) => {
            info!("Serving {} ({} bytes)", path, meta.size);
            CommandResult {
                data: Some(CommandData::Download {
                    file,
                    size: meta.size,
                }),
                ..CommandResult::success(format_response(
                    responses::OK,
                    &format!("{} {}", meta.size, meta.file_name),
                ))
            }
        }
        Err(e) => storage_failure(e),
    }
}

async fn handle_cmd_stat(path: &str, service: &FileStorageService) -> CommandResult {
    match service.stat_file(path).await {
        Ok(meta) => CommandResult::success(format_response(
            responses::OK,
            &format!("{} {}", meta.size, meta.file_name),
        )),
        Err(e) => storage_failure(e),
    }
}

async fn handle_cmd_exists(path: &str, service: &FileStorageService) -> CommandResult {
    let exists = service.file_exists(path).await;
    CommandResult::success(format_response(responses::OK, &exists.to_string()))
}

/// Handles the DEL command: missing files count as deleted.
async fn handle_cmd_del(path: &str, service: &FileStorageService) -> CommandResult {
    match service.delete_file(path).await {
        Ok(()) => CommandResult::success(format_response(responses::DELETED, "Deleted")),
        Err(e) => storage_failure(e),
    }
}

fn handle_cmd_unknown() -> CommandResult {
    CommandResult::failure(
        "Unknown command",
        format_response(responses::UNKNOWN_COMMAND, "Unknown command"),
    )
}

fn idle_close() -> CommandResult {
    CommandResult::close(format_response(responses::CLOSING, "Idle timeout"))
}

fn storage_failure(err: StorageError) -> CommandResult {
    CommandResult::failure(err.to_string(), storage_error_reply(&err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RuntimeLimits, StorageSettings};
    use crate::protocol::{CommandStatus, parse_command};
    use crate::client::idle::IdleTimeout;
    use crate::storage::service::STAGING_DIR;
    use std::time::Duration;
    use tokio::io::AsyncWriteExt;
    use std::sync::Arc;
    use tempfile::TempDir;
    use tokio::sync::RwLock;

    fn setup(dir: &TempDir) -> (FileStorageService, SharedRuntimeLimits) {
        let settings = StorageSettings {
            root: dir.path().to_string_lossy().to_string(),
            ..StorageSettings::default()
        };
        let limits = Arc::new(RwLock::new(RuntimeLimits {
            max_clients: 1,
            max_file_size_mb: 1,
        }));
        (FileStorageService::new(&settings, limits.clone()), limits)
    }

    async fn run(
        line: &str,
        body: &[u8],
        service: &FileStorageService,
        limits: &SharedRuntimeLimits,
    ) -> (CommandResult, usize) {
        let mut reader = body;
        let result = handle_command(&parse_command(line), &mut reader, service, limits).await;
        (result, reader.len())
    }

    fn message(result: &CommandResult) -> &str {
        result.message.as_deref().unwrap_or("")
    }

    #[tokio::test]
    async fn save_consumes_exactly_the_declared_bytes() {
        let dir = TempDir::new().unwrap();
        let (service, limits) = setup(&dir);

        let (result, left) = run("SAVE docs 5 report.pdf", b"helloPING\n", &service, &limits).await;
        assert_eq!(result.status, CommandStatus::Success);
        assert!(message(&result).starts_with("201 uploads/docs/"));
        assert!(message(&result).trim_end().ends_with("-report.pdf"));
        assert_eq!(left, "PING\n".len());
    }

    #[tokio::test]
    async fn rejected_save_still_drains_payload() {
        let dir = TempDir::new().unwrap();
        let (service, limits) = setup(&dir);

        let (result, left) = run("SAVE docs 3 ..", b"abcNEXT", &service, &limits).await;
        assert!(matches!(result.status, CommandStatus::Failure(_)));
        assert_eq!(message(&result), "400 Invalid file name\r\n");
        assert_eq!(left, "NEXT".len());
    }

    #[tokio::test]
    async fn empty_save_is_bad_request() {
        let dir = TempDir::new().unwrap();
        let (service, limits) = setup(&dir);

        let (result, _) = run("SAVE docs 0 a.txt", b"", &service, &limits).await;
        assert_eq!(message(&result), "400 File is empty\r\n");
    }

    #[tokio::test]
    async fn oversized_declaration_closes_connection() {
        let dir = TempDir::new().unwrap();
        let (service, limits) = setup(&dir);

        let line = format!("SAVE docs {} big.bin", 2 * 1024 * 1024);
        let (result, _) = run(&line, b"", &service, &limits).await;
        assert_eq!(result.status, CommandStatus::CloseConnection);
        assert_eq!(message(&result), "413 File too large\r\n");
    }

    #[tokio::test]
    async fn short_payload_closes_and_keeps_nothing() {
        let dir = TempDir::new().unwrap();
        let (service, limits) = setup(&dir);

        let (result, _) = run("SAVE docs 10 a.txt", b"abc", &service, &limits).await;
        assert_eq!(result.status, CommandStatus::CloseConnection);
        assert_eq!(message(&result), "400 Incomplete upload\r\n");

        let entries = std::fs::read_dir(dir.path().join("uploads/docs")).unwrap();
        assert_eq!(entries.count(), 0);
        let staged = std::fs::read_dir(dir.path().join(STAGING_DIR)).unwrap();
        assert_eq!(staged.count(), 0);
    }

    #[tokio::test]
    async fn stalled_payload_closes_and_cleans_staging() {
        let dir = TempDir::new().unwrap();
        let (service, limits) = setup(&dir);
        let (mut tx, rx) = tokio::io::duplex(64);
        let mut reader = IdleTimeout::new(rx, Duration::from_millis(100));

        tx.write_all(b"first bytes").await.unwrap();
        let command = parse_command("SAVE docs 1000 a.txt");
        let result = handle_command(&command, &mut reader, &service, &limits).await;

        assert_eq!(result.status, CommandStatus::CloseConnection);
        assert_eq!(message(&result), "421 Idle timeout\r\n");
        let staged = std::fs::read_dir(dir.path().join(STAGING_DIR)).unwrap();
        assert_eq!(staged.count(), 0);
        drop(tx);
    }

    #[tokio::test]
    async fn get_stat_exists_del_flow() {
        let dir = TempDir::new().unwrap();
        let (service, limits) = setup(&dir);
        let saved = service
            .save_file(&b"hello"[..], "report.pdf", "docs")
            .await
            .unwrap();
        let path = saved.relative_path;

        let (result, _) = run(&format!("STAT {path}"), b"", &service, &limits).await;
        assert_eq!(message(&result), "200 5 report.pdf\r\n");

        let (result, _) = run(&format!("GET {path}"), b"", &service, &limits).await;
        assert_eq!(message(&result), "200 5 report.pdf\r\n");
        match result.data {
            Some(CommandData::Download { mut file, size }) => {
                assert_eq!(size, 5);
                let mut bytes = Vec::new();
                file.read_to_end(&mut bytes).await.unwrap();
                assert_eq!(bytes, b"hello");
            }
            None => panic!("GET returned no payload"),
        }

        let (result, _) = run(&format!("EXISTS {path}"), b"", &service, &limits).await;
        assert_eq!(message(&result), "200 true\r\n");

        for _ in 0..2 {
            let (result, _) = run(&format!("DEL {path}"), b"", &service, &limits).await;
            assert_eq!(message(&result), "204 Deleted\r\n");
        }

        let (result, _) = run(&format!("EXISTS {path}"), b"", &service, &limits).await;
        assert_eq!(message(&result), "200 false\r\n");

        let (result, _) = run(&format!("GET {path}"), b"", &service, &limits).await;
        assert_eq!(message(&result), "404 File not found\r\n");
    }

    #[tokio::test]
    async fn traversal_paths_are_bad_requests() {
        let dir = TempDir::new().unwrap();
        let (service, limits) = setup(&dir);

        let (result, _) = run("GET uploads/../../etc/passwd", b"", &service, &limits).await;
        assert_eq!(message(&result), "400 Invalid path\r\n");

        let (result, _) = run("DEL ../config.toml", b"", &service, &limits).await;
        assert_eq!(message(&result), "400 Invalid path\r\n");
    }

    #[tokio::test]
    async fn unknown_and_quit() {
        let dir = TempDir::new().unwrap();
        let (service, limits) = setup(&dir);

        let (result, _) = run("LIST", b"", &service, &limits).await;
        assert_eq!(message(&result), "500 Unknown command\r\n");

        let (result, _) = run("QUIT", b"", &service, &limits).await;
        assert_eq!(result.status, CommandStatus::CloseConnection);
        assert_eq!(message(&result), "221 Goodbye\r\n");
    }
}
