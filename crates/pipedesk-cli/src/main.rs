//! pipedesk - a terminal client for the PipeDesk CRM.
//!
//! A thin front end over `pipedesk-core`: it resumes the saved session,
//! renders entity listings as text, and drives the account operations. All
//! session and API logic lives in the core crate.

mod commands;

use std::io;

use anyhow::Result;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber for logging.
/// Use the RUST_LOG env var to control the log level (e.g. RUST_LOG=debug).
fn init_tracing() -> tracing_appender::non_blocking::WorkerGuard {
    let (writer, guard) = tracing_appender::non_blocking(io::stderr());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer))
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let _guard = init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        print_usage();
        return Ok(());
    }

    if let Err(error) = commands::run(&args).await {
        // One blocking message per failure, nothing structured reaches here
        eprintln!("Error: {}", error);
        std::process::exit(1);
    }
    Ok(())
}

fn print_usage() {
    println!(
        "pipedesk - terminal client for the PipeDesk CRM

Usage: pipedesk <command> [args]

Account:
  login [username] [--remember]   Sign in (password prompted or from keychain)
  signup                          Create a new account
  logout                          Sign out and clear the stored session
  status                          Show the current session state
  profile                         Update your own profile
  delete-account [--yes]          Delete your own account
  watch                           Stay resident and report session transitions

Entities:
  list <companies|contacts|leads|deals|users>
  show <entity> <id>
  remove <entity> <id>

Administration:
  promote <user-id>               Grant the admin role
  disable <user-id>               Disable a user account
  enable <user-id>                Re-enable a user account
  gong <register|schema|push>     Drive the Gong integration

The API base URL comes from PIPEDESK_API_URL or the config file."
    );
}
