//! Interactive tdl download menu.

use std::path::PathBuf;

use clap::Parser;
use telegram_relay::commands::menu;

#[derive(Parser)]
#[command(name = "tdl_menu", about = "Interactive tdl downloader")]
struct Args {
    /// Path to the tdl executable
    #[arg(long)]
    tdl_path: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    menu::run(Args::parse().tdl_path).await?;
    Ok(())
}
