//! Forward a range of message ids into a chat reached by invite link.

use clap::Parser;
use telegram_relay::commands::{forward, InviteCli};

#[derive(Parser)]
#[command(name = "forward_via_invite", about = "Forward messages to an invite link")]
struct Args {
    #[command(flatten)]
    invite: InviteCli,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();
    let args = Args::parse();
    forward::run(args.invite.into()).await?;
    Ok(())
}
