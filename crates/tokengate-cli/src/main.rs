//! tokengate - command-line front end for the tokengate auth client.
//!
//! Signs in against the configured backend, keeps the session token in the
//! chosen storage backend, and answers route-guard questions the same way a
//! web front end would.

mod app;

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::App;

/// Environment variable overriding the backend address
const API_BASE_ENV: &str = "TOKENGATE_API_BASE";

/// Environment variable enabling file logging into the given directory
const LOG_DIR_ENV: &str = "TOKENGATE_LOG_DIR";

/// Log file name prefix (rotated daily)
const LOG_FILE: &str = "tokengate.log";

#[derive(Parser, Debug)]
#[command(name = "tokengate", version, about = "Sign in to an auth backend and check protected routes")]
struct Cli {
    /// Backend base URL (overrides config file and TOKENGATE_API_BASE)
    #[arg(long, global = true)]
    api_base: Option<String>,

    /// Where the session token is kept
    #[arg(long, global = true, value_enum, default_value_t = StorageKind::File)]
    storage: StorageKind,

    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageKind {
    /// JSON file in the local data directory
    File,
    /// OS keychain
    Keyring,
    /// No persistence; every run starts signed out
    None,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in with email and password
    Login {
        #[arg(long)]
        email: Option<String>,
    },
    /// Create an account
    Signup {
        #[arg(long)]
        email: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Fetch the signed-in user's profile
    Whoami,
    /// Show the local session state without contacting the backend
    Status,
    /// Decide whether navigation to PATH may proceed. Only paths under the
    /// configured `protected_prefixes` are checked unless --protected is given.
    Guard {
        path: String,
        /// Evaluate as server-side rendering
        #[arg(long)]
        server: bool,
        /// Treat PATH as protected regardless of configured prefixes
        #[arg(long)]
        protected: bool,
    },
    /// Print the effective configuration
    Config,
}

/// Initialize the tracing subscriber for logging
fn init_tracing() -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match std::env::var_os(LOG_DIR_ENV) {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE);
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

    let cli = Cli::parse();

    // Flushes the file log on drop
    let _log_guard = init_tracing();
    info!(command = ?cli.command, "tokengate starting");

    let api_base = cli
        .api_base
        .clone()
        .or_else(|| std::env::var(API_BASE_ENV).ok());
    let app = App::new(cli.config.as_deref(), api_base, cli.storage)?;

    match cli.command {
        Command::Login { email } => app.login(email).await,
        Command::Signup { email } => app.signup(email).await,
        Command::Logout => {
            app.logout();
            Ok(())
        }
        Command::Whoami => app.whoami().await,
        Command::Status => app.status(),
        Command::Guard {
            path,
            server,
            protected,
        } => app.guard(&path, server, protected),
        Command::Config => app.print_config(),
    }
}
