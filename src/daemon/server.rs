//! UNIX socket server for daemon mode.
//!
//! Listens on a UNIX socket, reads one NDJSON request per connection, and
//! dispatches it to DaemonService.
//!
//! CHANGELOG:
//! - 02/07/2026 - Initial implementation

use anyhow::Result;
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::daemon::{protocol, service::DaemonService};

/// Daemon server listening on UNIX socket.
pub struct DaemonServer {
    service: DaemonService,
    socket_path: PathBuf,
}

impl DaemonServer {
    pub fn new(service: DaemonService, socket_path: impl AsRef<Path>) -> Self {
        Self {
            service,
            socket_path: socket_path.as_ref().to_path_buf(),
        }
    }

    /// Start serving requests (blocking).
    pub fn serve(&self) -> Result<()> {
        // Clean up stale socket
        let _ = std::fs::remove_file(&self.socket_path);

        let listener = UnixListener::bind(&self.socket_path)?;

        // Owner-only (0600)
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.socket_path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::info!(socket = ?self.socket_path, "daemon listening");

        // Accept connections sequentially (single-threaded)
        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    if let Err(e) = self.handle_connection(stream) {
                        tracing::warn!(error = %e, "connection error");
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "accept error");
                }
            }
        }

        Ok(())
    }

    /// Handle a single client connection.
    fn handle_connection(&self, stream: UnixStream) -> Result<()> {
        let mut writer = stream.try_clone()?;
        let mut reader = BufReader::new(&stream);

        let mut line = String::new();
        reader.read_line(&mut line)?;

        if line.trim().is_empty() {
            return Ok(()); // Client disconnected
        }

        let response = self.handle_line(&line);
        writer.write_all(response.to_ndjson_line()?.as_bytes())?;
        writer.flush()?;

        Ok(())
    }

    /// Turn one request line into exactly one response.
    pub fn handle_line(&self, line: &str) -> protocol::Response {
        let start = Instant::now();
        let elapsed_ms = |start: Instant| start.elapsed().as_secs_f64() * 1000.0;

        let request = match protocol::Request::from_ndjson_line(line) {
            Ok(request) => request,
            Err(e) => {
                return protocol::Response::error(
                    String::new(),
                    "INVALID_JSON",
                    format!("{:#}", e),
                    elapsed_ms(start),
                )
            }
        };

        tracing::debug!(id = %request.id, method = %request.method, "request");
        match self.service.dispatch(&request.method, request.params) {
            Ok(result) => protocol::Response::success(request.id, result, elapsed_ms(start)),
            Err(e) => protocol::Response::error(request.id, e.code(), e.to_string(), elapsed_ms(start)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::provider::SqliteStore;
    use crate::permission::StaticPermissionSystem;
    use rusqlite::Connection;
    use std::sync::Arc;

    fn server() -> DaemonServer {
        let conn = Connection::open_in_memory().unwrap();
        SqliteStore::create_schema(&conn).unwrap();
        let service = DaemonService::with_parts(
            SqliteStore::from_connection(conn),
            Arc::new(StaticPermissionSystem {
                foreground_activity: true,
                grant: true,
            }),
        );
        DaemonServer::new(service, "/tmp/unused.sock")
    }

    #[test]
    fn test_invalid_json_line() {
        let resp = server().handle_line("{nope\n");
        assert!(!resp.ok);
        assert_eq!(resp.error.unwrap().code, "INVALID_JSON");
    }

    #[test]
    fn test_list_over_lines() {
        let srv = server();
        let perm = srv.handle_line(r#"{"id":"p","method":"requestReadSmsPermission"}"#);
        assert_eq!(perm.id, "p");
        assert!(perm.ok);

        let resp = srv.handle_line(r#"{"id":"l","method":"list","params":{"filter":""}}"#);
        assert!(resp.ok);
        assert_eq!(resp.result.unwrap(), serde_json::json!([0, "[]"]));
    }

    #[test]
    fn test_failure_carries_kind_code() {
        let srv = server();
        let resp = srv.handle_line(r#"{"id":"x","method":"list"}"#);
        assert!(!resp.ok);
        let error = resp.error.unwrap();
        assert_eq!(error.code, "STORE_UNAVAILABLE");
        assert!(error.message.contains("READ_SMS"));
    }
}
