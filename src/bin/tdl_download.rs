//! Download messages (including links across forum threads) with tdl.

use clap::Parser;
use telegram_relay::commands::{download, DownloadArgs};

#[derive(Parser)]
#[command(name = "tdl_download", about = "Download Telegram messages with tdl")]
struct Args {
    #[command(flatten)]
    download: DownloadArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    download::run(Args::parse().download).await?;
    Ok(())
}
