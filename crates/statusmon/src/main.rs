//! status-monitor: check every configured service once and email on change.
//!
//! Meant to be invoked periodically by an external timer (cron, systemd
//! timer). Each invocation is one finite batch.
//!
//! # Usage
//!
//! ```text
//! status-monitor run ./config.toml ./status.redb
//! status-monitor status ./status.redb --format json
//! status-monitor test-email ./config.toml --to me@example.com
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::status::OutputFormat;

#[derive(Parser)]
#[command(
    name = "status-monitor",
    about = "Service availability monitor with email notifications",
    version,
    propagate_version = true
)]
struct Cli {
    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Check every service once, notify on status changes and exit.
    Run {
        /// Path to the configuration file.
        #[arg(default_value = "./config.toml")]
        config: PathBuf,
        /// Path to the status database (created if missing).
        #[arg(default_value = "./status.redb")]
        database: PathBuf,
    },
    /// Print the last stored status of every service.
    Status {
        /// Path to the status database.
        #[arg(default_value = "./status.redb")]
        database: PathBuf,
        /// Output format.
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Send a test message through the configured SMTP account.
    TestEmail {
        /// Path to the configuration file.
        #[arg(default_value = "./config.toml")]
        config: PathBuf,
        /// Address to send the test message to.
        #[arg(long)]
        to: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    match cli.command {
        Commands::Run { config, database } => commands::run::run(&config, &database).await,
        Commands::Status { database, format } => commands::status::status(&database, format),
        Commands::TestEmail { config, to } => commands::test_email::test_email(&config, &to).await,
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,statusmon=debug"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}
