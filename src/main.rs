//! wolfies-sms - CLI over the SMS store.
//!
//! Reads messages through the same filter -> query -> serialize pipeline the
//! daemon exposes to the host.
//!
//! CHANGELOG:
//! - 02/07/2026 - --days relative window, check command
//! - 02/06/2026 - Initial scaffold with list command

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::process::ExitCode;

use wolfies_sms::config::{self, Config};
use wolfies_sms::db::connection;
use wolfies_sms::output::{self, OutputControls};
use wolfies_sms::{EngineError, FilterDescriptor, MessageBox, SmsEngine, SmsMessage, SqliteStore};

const MS_PER_DAY: i64 = 86_400_000;

/// SMS inbox reader - parameterized queries over the local SMS store.
#[derive(Parser, Debug)]
#[command(name = "wolfies-sms")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Compact JSON output (no whitespace)
    #[arg(long, global = true)]
    compact: bool,

    /// Truncate message bodies to this length
    #[arg(long, global = true)]
    max_text_chars: Option<u32>,

    /// Config file (default: $WOLFIES_SMS_CONFIG or ~/.wolfies-sms/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List messages, newest first
    List {
        /// Filter as JSON, e.g. '{"box":"inbox","maxCount":20}'
        #[arg(long, conflicts_with_all = ["message_box", "min_date", "max_date", "days", "max_count"])]
        filter: Option<String>,

        /// Conversation side
        #[arg(long = "box", value_parser = ["inbox", "sent"])]
        message_box: Option<String>,

        /// Lower date bound (ms since epoch, inclusive)
        #[arg(long)]
        min_date: Option<i64>,

        /// Upper date bound (ms since epoch, inclusive)
        #[arg(long)]
        max_date: Option<i64>,

        /// Only messages from the last N days (ignored when --min-date is set)
        #[arg(long)]
        days: Option<u32>,

        /// Max messages (default 100)
        #[arg(long)]
        max_count: Option<NonZeroU32>,

        /// SMS database path (default: from config)
        #[arg(long)]
        db: Option<PathBuf>,
    },

    /// Check whether the SMS store is readable
    Check {
        /// SMS database path (default: from config)
        #[arg(long)]
        db: Option<PathBuf>,
    },
}

/// Descriptor from the individual `list` flags.
fn descriptor_from_flags(
    message_box: Option<&str>,
    min_date: Option<i64>,
    max_date: Option<i64>,
    days: Option<u32>,
    max_count: Option<NonZeroU32>,
    now_ms: i64,
) -> FilterDescriptor {
    let mut desc = FilterDescriptor::default();
    if let Some(b) = message_box.and_then(MessageBox::from_name) {
        desc = desc.with_box(b);
    }
    match (min_date, days) {
        (Some(min), _) => desc = desc.with_min_date(min),
        (None, Some(days)) => desc = desc.with_min_date(now_ms - i64::from(days) * MS_PER_DAY),
        (None, None) => {}
    }
    if let Some(max) = max_date {
        desc = desc.with_max_date(max);
    }
    if let Some(n) = max_count {
        desc = desc.with_max_count(n);
    }
    desc
}

fn resolve_db(db: Option<PathBuf>, config: &Config) -> PathBuf {
    db.map(|p| config::expand_path(&p))
        .unwrap_or_else(|| config.db_path.clone())
}

fn cmd_list(
    filter: Option<String>,
    desc: FilterDescriptor,
    db: PathBuf,
    controls: &OutputControls,
) -> Result<()> {
    let engine = SmsEngine::new(SqliteStore::at_path(db));
    let payload = match filter {
        Some(raw) => engine.execute(Some(&raw))?,
        None => engine.execute_descriptor(&desc)?,
    };

    let messages: Vec<SmsMessage> =
        serde_json::from_str(&payload.messages).context("Failed to decode message payload")?;
    println!("{}", controls.render_messages(&messages));
    Ok(())
}

fn cmd_check(db: PathBuf, controls: &OutputControls) -> Result<bool> {
    let readable = connection::check_access(&db);
    if controls.json {
        println!(
            "{}",
            controls.emit(&json!({
                "db_path": db.display().to_string(),
                "readable": readable,
            }))
        );
    } else if readable {
        println!("SMS store readable at {}", db.display());
    } else {
        println!("SMS store NOT readable at {}", db.display());
    }
    Ok(readable)
}

fn main() -> ExitCode {
    // Initialize tracing/logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let output_controls = OutputControls {
        json: cli.json,
        compact: cli.compact,
        max_text_chars: cli.max_text_chars,
    };

    let config = match &cli.config {
        Some(path) => Config::load(path),
        None => Config::load_default(),
    };

    let result = config.and_then(|config| match cli.command {
        Command::List {
            filter,
            message_box,
            min_date,
            max_date,
            days,
            max_count,
            db,
        } => {
            let desc = descriptor_from_flags(
                message_box.as_deref(),
                min_date,
                max_date,
                days,
                max_count,
                chrono::Utc::now().timestamp_millis(),
            );
            cmd_list(filter, desc, resolve_db(db, &config), &output_controls).map(|()| true)
        }
        Command::Check { db } => cmd_check(resolve_db(db, &config), &output_controls),
    });

    match result {
        Ok(true) => ExitCode::from(0),
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            if cli.json {
                let code = e
                    .downcast_ref::<EngineError>()
                    .map(EngineError::kind_code)
                    .unwrap_or("ERROR");
                println!("{}", output::format_error(code, &format!("{:#}", e)));
            } else {
                eprintln!("Error: {:#}", e);
            }
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000_000;

    #[test]
    fn test_cli_parses_list_flags() {
        let cli = Cli::try_parse_from([
            "wolfies-sms", "list", "--box", "sent", "--max-count", "5", "--json",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Command::List { message_box, max_count, .. } => {
                assert_eq!(message_box.as_deref(), Some("sent"));
                assert_eq!(max_count.map(NonZeroU32::get), Some(5));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_filter_conflicts_with_flags() {
        let err = Cli::try_parse_from([
            "wolfies-sms", "list", "--filter", "{}", "--box", "inbox",
        ]);
        assert!(err.is_err());
    }

    #[test]
    fn test_rejects_unknown_box_and_zero_count() {
        assert!(Cli::try_parse_from(["wolfies-sms", "list", "--box", "drafts"]).is_err());
        assert!(Cli::try_parse_from(["wolfies-sms", "list", "--max-count", "0"]).is_err());
    }

    #[test]
    fn test_days_sets_min_date() {
        let desc = descriptor_from_flags(Some("inbox"), None, None, Some(30), None, NOW);
        assert_eq!(desc.message_box(), Some(MessageBox::Inbox));
        assert_eq!(desc.min_date(), Some(NOW - 30 * MS_PER_DAY));
        assert_eq!(desc.max_date(), None);
    }

    #[test]
    fn test_explicit_min_date_wins_over_days() {
        let desc = descriptor_from_flags(None, Some(42), Some(99), Some(7), None, NOW);
        assert_eq!(desc.min_date(), Some(42));
        assert_eq!(desc.max_date(), Some(99));
        assert_eq!(desc.effective_max_count(), 100);
    }
}
