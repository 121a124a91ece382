//! rollcall server - class attendance tracking API.
//!
//! With no arguments the HTTP server starts. Maintenance switches:
//!
//! - `--seed-admin <username> <password>` creates a dashboard account if absent
//! - `--parse-roster <file> [--line-by-line]` prints the members a roster
//!   file would import, without touching the database

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use rollcall_core::auth::hash_password;
use rollcall_core::import::{extract_text, parse_roster, parse_roster_lines};
use rollcall_core::RosterStore;
use rollcall_server::Config;

/// File name prefix for the daily log files under LOG_DIR
const LOG_FILE_PREFIX: &str = "rollcall.log";

const USAGE: &str = "Usage:
  rollcall-server
  rollcall-server --seed-admin <username> <password>
  rollcall-server --parse-roster <file> [--line-by-line]";

/// Initialize the tracing subscriber for logging.
///
/// Logs go to stderr, and also to a daily file when `log_dir` is set. The
/// returned guard flushes the file writer and must live until exit.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    // RUST_LOG controls the level (e.g. RUST_LOG=rollcall_core=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();
    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let log_dir = std::env::var_os("LOG_DIR").map(PathBuf::from);
    let _guard = init_tracing(log_dir.as_deref());

    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(String::as_str) {
        None => {
            info!("rollcall server starting");
            let config = Config::from_env()?;
            rollcall_server::serve(config).await
        }
        Some("--seed-admin") => match (args.get(2), args.get(3)) {
            (Some(username), Some(password)) => seed_admin(username, password),
            _ => bail!("--seed-admin needs a username and a password\n\n{}", USAGE),
        },
        Some("--parse-roster") => match args.get(2) {
            Some(file) => {
                let line_by_line = args.iter().skip(3).any(|a| a == "--line-by-line");
                parse_roster_file(Path::new(file), line_by_line)
            }
            None => bail!("--parse-roster needs a file\n\n{}", USAGE),
        },
        Some("--help") | Some("-h") => {
            println!("{}", USAGE);
            Ok(())
        }
        Some(other) => bail!("Unknown argument: {}\n\n{}", other, USAGE),
    }
}

fn seed_admin(username: &str, password: &str) -> Result<()> {
    let username = username.trim();
    if username.is_empty() || password.is_empty() {
        bail!("Username and password must not be empty");
    }

    let config = Config::from_env()?;
    let store = RosterStore::open(&config.database_path).with_context(|| {
        format!("Failed to open database at {}", config.database_path.display())
    })?;

    if store.find_user(username)?.is_some() {
        println!("User '{}' already exists", username);
        return Ok(());
    }

    let hash = hash_password(password)?;
    let user = store.create_user(username, &hash)?;
    println!("Created user '{}' (id {})", user.username, user.id);
    Ok(())
}

fn parse_roster_file(path: &Path, line_by_line: bool) -> Result<()> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let filename = path.file_name().and_then(|n| n.to_str());
    let text = extract_text(filename, None, &bytes)?;

    let found = if line_by_line {
        parse_roster_lines(&text)
    } else {
        parse_roster(&text)
    };

    for candidate in &found {
        println!("{:<40} {:<8} {}", candidate.name, candidate.sex.as_str(), candidate.track.as_str());
    }
    println!("{} members found", found.len());
    Ok(())
}
