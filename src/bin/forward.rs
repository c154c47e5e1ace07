//! Forward a range of message ids between two chats.

use clap::Parser;
use telegram_relay::commands::{forward, ForwardCli};

#[derive(Parser)]
#[command(name = "forward", about = "Forward messages by id range")]
struct Args {
    #[command(flatten)]
    forward: ForwardCli,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();
    let args = Args::parse();
    forward::run(args.forward.into()).await?;
    Ok(())
}
