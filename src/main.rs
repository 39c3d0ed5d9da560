//! # BreadDuty — Office Bread-Duty Roster Server
//!
//! Keeps the duty directory, generates a balanced Tuesday/Thursday roster,
//! emails reminders ahead of each turn, and sends the day-of broadcast.
//!
//! Usage:
//!   breadduty                         # Start with ~/.breadduty/config.toml
//!   breadduty --port 9000             # Override the gateway port
//!   breadduty --config ./dev.toml     # Explicit config file

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use breadduty_core::config::BreadDutyConfig;
use breadduty_mailer::{MailTransport, NullTransport, Outbox, SmtpMailer};
use breadduty_store::Store;

#[derive(Parser)]
#[command(
    name = "breadduty",
    version,
    about = "Office bread-duty roster with balanced scheduling and email reminders"
)]
struct Cli {
    /// Path to the config file (default: ~/.breadduty/config.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Gateway port (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn expand_path(p: &str) -> String {
    shellexpand::tilde(p).to_string()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "breadduty=debug,tower_http=debug"
    } else {
        "breadduty=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    // Load config
    let mut config = match &cli.config {
        Some(path) => BreadDutyConfig::load_from(std::path::Path::new(&expand_path(path)))?,
        None => BreadDutyConfig::load()?,
    };
    if let Some(port) = cli.port {
        config.gateway.port = port;
    }

    // Open database
    let db_path = expand_path(&config.database.path);
    if let Some(parent) = std::path::Path::new(&db_path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    let store = Arc::new(Store::open(std::path::Path::new(&db_path))?);
    tracing::info!("Database ready: {db_path}");

    // Mail transport: real SMTP when configured, otherwise a logging stub
    let transport: Arc<dyn MailTransport> = if config.smtp.host.is_empty() {
        tracing::warn!("SMTP not configured; mails will be logged and dropped");
        Arc::new(NullTransport)
    } else {
        Arc::new(SmtpMailer::from_config(&config.smtp)?)
    };
    let outbox = Outbox::spawn(transport);

    // Background jobs: daily reminders, daily purge, day-of broadcast
    breadduty_scheduler::spawn_jobs(store.clone(), outbox.clone(), config.scheduler.clone());

    println!("BreadDuty v{}", env!("CARGO_PKG_VERSION"));
    println!(
        "   API:      http://{}:{}",
        config.gateway.host, config.gateway.port
    );
    println!("   Database: {db_path}");
    if config.smtp.host.is_empty() {
        println!("   SMTP:     (not configured)");
    } else {
        println!("   SMTP:     {}:{}", config.smtp.host, config.smtp.port);
    }
    println!();

    breadduty_gateway::start(&config.gateway, store, outbox).await?;

    Ok(())
}
