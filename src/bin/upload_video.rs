//! Upload videos as streaming media.

use clap::Parser;
use telegram_relay::commands::{upload, UploadArgs};

#[derive(Parser)]
#[command(name = "upload_video", about = "Upload videos with streaming support")]
struct Args {
    #[command(flatten)]
    upload: UploadArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();
    upload::run(Args::parse().upload).await?;
    Ok(())
}
