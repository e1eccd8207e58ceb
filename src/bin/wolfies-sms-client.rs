//! wolfies-sms-client - Thin client for daemon mode.
//!
//! CHANGELOG:
//! - 02/07/2026 - Initial implementation

use anyhow::{Context, Result};
use clap::Parser;
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::PathBuf;
use std::time::Duration;

use wolfies_sms::config;
use wolfies_sms::daemon::protocol::{Request, Response};

#[derive(Parser)]
#[command(name = "wolfies-sms-client")]
#[command(about = "Thin client for wolfies-sms daemon")]
struct Cli {
    /// Method to call (health, list, requestReadSmsPermission)
    method: String,

    /// Socket path (default: ~/.wolfies-sms/daemon.sock)
    #[arg(long)]
    socket: Option<String>,

    /// JSON parameters (as string), e.g. '{"filter": {"box": "inbox"}}'
    #[arg(long)]
    params: Option<String>,

    /// Request timeout (seconds)
    #[arg(long, default_value = "35.0")]
    timeout: f64,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let params: HashMap<String, serde_json::Value> = match &cli.params {
        Some(p) => serde_json::from_str(p).context("--params must be a JSON object")?,
        None => HashMap::new(),
    };

    let request = Request::new(cli.method, params);

    let socket_path = match &cli.socket {
        Some(s) => PathBuf::from(shellexpand::tilde(s).into_owned()),
        None => config::default_socket_path(),
    };
    let stream = UnixStream::connect(&socket_path)
        .with_context(|| format!("Daemon not reachable at {}", socket_path.display()))?;

    let timeout = Duration::from_secs_f64(cli.timeout);
    stream.set_read_timeout(Some(timeout))?;
    stream.set_write_timeout(Some(timeout))?;

    // Send request (NDJSON)
    (&stream).write_all(request.to_ndjson_line()?.as_bytes())?;

    // Read response (NDJSON)
    let mut reader = BufReader::new(&stream);
    let mut response_line = String::new();
    reader.read_line(&mut response_line)?;

    let response = Response::from_ndjson_line(&response_line)?;

    if response.ok {
        // Success: print result only
        let result = response.result.unwrap_or(serde_json::Value::Null);
        println!("{}", serde_json::to_string_pretty(&result)?);
        Ok(())
    } else {
        let (code, message) = response
            .error
            .map(|e| (e.code, e.message))
            .unwrap_or_else(|| ("ERROR".to_string(), "unknown".to_string()));
        eprintln!("Error [{}]: {}", code, message);
        std::process::exit(1);
    }
}
