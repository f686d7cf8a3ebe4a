//! Telegram Dialog Exporter — main entry point

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use telegram_exporter::config::{Config, DEFAULT_OUTPUT_DIR, DEFAULT_SESSION_FILE};
use telegram_exporter::shell;

#[derive(Parser)]
#[command(name = "telegram_exporter")]
#[command(about = "Export Telegram dialog history to styled documents", long_about = None)]
#[command(version)]
struct Cli {
    /// Telegram API id (from https://my.telegram.org)
    #[arg(long, env = "API_ID")]
    api_id: i32,

    /// Telegram API hash
    #[arg(long, env = "API_HASH")]
    api_hash: String,

    /// Phone number for first-time login; prompted when omitted
    #[arg(long, env = "PHONE")]
    phone: Option<String>,

    /// Path of the session token file
    #[arg(long, env = "SESSION_FILE", default_value = DEFAULT_SESSION_FILE)]
    session_file: PathBuf,

    /// Maximum messages per dialog: a number, or "none"/"unbounded"
    #[arg(long, env = "LIMIT")]
    limit: Option<String>,

    /// Export format: html | md | json
    #[arg(long, env = "EXPORT_FORMAT", default_value = "html")]
    format: String,

    /// Directory for exported files
    #[arg(long, env = "OUTPUT_DIR", default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env for local development
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("telegram_exporter=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let config = Config::build(
        cli.api_id,
        cli.api_hash,
        cli.phone,
        cli.session_file,
        cli.limit.as_deref(),
        &cli.format,
        cli.output_dir,
    )?;

    shell::run(&config).await?;
    Ok(())
}
