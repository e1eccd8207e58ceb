//! wolfies-sms-daemon - Persistent daemon holding the SMS store and permission state.
//!
//! CHANGELOG:
//! - 02/07/2026 - Initial implementation

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use wolfies_sms::config::{self, Config};
use wolfies_sms::daemon::{server::DaemonServer, service::DaemonService};

#[derive(Parser)]
#[command(name = "wolfies-sms-daemon")]
#[command(about = "Persistent daemon for wolfies-sms")]
struct Cli {
    /// Config file (default: $WOLFIES_SMS_CONFIG or ~/.wolfies-sms/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the daemon
    Start {
        /// Socket path (default: from config)
        #[arg(long)]
        socket: Option<String>,

        /// Run in foreground (don't daemonize)
        #[arg(long)]
        foreground: bool,
    },

    /// Stop the daemon
    Stop {
        /// Socket path
        #[arg(long)]
        socket: Option<String>,
    },

    /// Check daemon status
    Status {
        /// Socket path
        #[arg(long)]
        socket: Option<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };

    let socket = match &cli.command {
        Commands::Start { socket, .. } | Commands::Stop { socket } | Commands::Status { socket } => {
            socket.clone()
        }
    };
    if let Some(socket) = socket {
        config.socket_path = config::expand_path(Path::new(&socket));
    }

    match cli.command {
        Commands::Start { foreground, .. } => cmd_start(&config, foreground),
        Commands::Stop { .. } => cmd_stop(&config.socket_path),
        Commands::Status { .. } => cmd_status(&config.socket_path),
    }
}

fn pid_file(socket_path: &Path) -> PathBuf {
    let mut name = socket_path.as_os_str().to_owned();
    name.push(".pid");
    PathBuf::from(name)
}

fn run_server(config: &Config) -> Result<()> {
    let service = DaemonService::new(config)?;
    DaemonServer::new(service, &config.socket_path).serve()
}

fn cmd_start(config: &Config, foreground: bool) -> Result<()> {
    // Create parent directory if needed
    if let Some(parent) = config.socket_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {:?}", parent))?;
    }

    if foreground {
        tracing::info!(db = ?config.db_path, "starting in foreground");
        return run_server(config);
    }

    use daemonize::Daemonize;

    let daemonize = Daemonize::new()
        .pid_file(pid_file(&config.socket_path))
        .working_directory("/tmp");

    match daemonize.start() {
        // Child process: run server
        Ok(_) => run_server(config),
        Err(e) => {
            eprintln!("Failed to daemonize: {}", e);
            std::process::exit(1);
        }
    }
}

fn cmd_stop(socket_path: &Path) -> Result<()> {
    let pid_file = pid_file(socket_path);

    let pid_str = std::fs::read_to_string(&pid_file)
        .with_context(|| format!("No pid file at {:?}", pid_file))?;
    let pid: i32 = pid_str
        .trim()
        .parse()
        .with_context(|| format!("Malformed pid file {:?}", pid_file))?;

    // SAFETY: kill(2) with a pid read from our own pid file; no memory is shared.
    let rc = unsafe { libc::kill(pid, libc::SIGTERM) };
    if rc != 0 {
        tracing::warn!(pid, error = %std::io::Error::last_os_error(), "SIGTERM failed");
    }

    let _ = std::fs::remove_file(&pid_file);
    let _ = std::fs::remove_file(socket_path);

    println!("Daemon stopped (pid {})", pid);

    Ok(())
}

fn cmd_status(socket_path: &Path) -> Result<()> {
    match std::os::unix::net::UnixStream::connect(socket_path) {
        Ok(_) => {
            println!("Daemon running at {}", socket_path.display());
            Ok(())
        }
        Err(_) => {
            println!("Daemon not running");
            std::process::exit(1);
        }
    }
}
