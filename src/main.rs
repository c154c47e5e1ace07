//! Telegram Relay CLI - main entry point
//!
//! Unified interface for forwarding, uploading and tdl downloads.

use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use telegram_relay::commands::{self, DownloadArgs, ForwardCli, InviteCli, UploadArgs};
use telegram_relay::metrics;
use tracing::warn;

#[derive(Parser)]
#[command(name = "telegram_relay")]
#[command(about = "Forward, upload and download Telegram messages", long_about = None)]
#[command(version)]
struct Cli {
    /// Address to expose Prometheus metrics (e.g., 0.0.0.0:9898)
    #[arg(long, env = "METRICS_ADDR")]
    metrics_addr: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Forward a range of message ids to another chat
    Forward(ForwardCli),

    /// Forward a range of message ids to a chat joined by invite link
    ForwardInvite(InviteCli),

    /// Upload a video (or a folder of videos) as streaming media
    Upload(UploadArgs),

    /// Download messages by link with tdl
    Download(DownloadArgs),

    /// Interactive tdl download menu
    Menu {
        /// Path to the tdl executable
        #[arg(long)]
        tdl_path: Option<PathBuf>,
    },

    /// Create a new session (interactive login)
    InitSession,
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Forward(_) => "forward",
            Commands::ForwardInvite(_) => "forward_invite",
            Commands::Upload(_) => "upload",
            Commands::Download(_) => "download",
            Commands::Menu { .. } => "menu",
            Commands::InitSession => "init_session",
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env for local development
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("telegram_relay=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    if let Some(addr) = cli.metrics_addr.as_deref() {
        match addr.parse::<SocketAddr>() {
            Ok(socket) => metrics::spawn_metrics_server(socket),
            Err(err) => warn!(%addr, "Invalid metrics address: {}", err),
        }
    }

    let command_name = cli.command.name();
    metrics::record_command_start(command_name);
    let start = Instant::now();

    let result = execute_command(cli.command).await;

    metrics::record_command_result(command_name, start.elapsed(), result.is_ok());

    result
}

async fn execute_command(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Forward(args) => {
            commands::forward::run(args.into()).await?;
        }
        Commands::ForwardInvite(args) => {
            commands::forward::run(args.into()).await?;
        }
        Commands::Upload(args) => {
            commands::upload::run(args).await?;
        }
        Commands::Download(args) => {
            commands::download::run(args).await?;
        }
        Commands::Menu { tdl_path } => {
            commands::menu::run(tdl_path).await?;
        }
        Commands::InitSession => {
            commands::init_session::run().await?;
        }
    }

    Ok(())
}
