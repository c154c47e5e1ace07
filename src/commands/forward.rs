//! Forward a message range between chats.

use std::time::Duration;

use tracing::info;

use crate::chat::ChatRef;
use crate::config::Config;
use crate::error::Result;
use crate::forward::{ForwardRequest, ForwardSummary, Forwarder};
use crate::session::{get_client, SessionLock};

/// Arguments shared by `forward` and `forward_via_invite`.
#[derive(Debug, Clone)]
pub struct ForwardArgs {
    pub source: i64,
    pub dest: ChatRef,
    pub start_id: i32,
    pub end_id: i32,
    pub bulk: bool,
    /// Overrides `forward.delay_ms` from the config.
    pub delay_ms: Option<u64>,
}

/// `forward <source> <dest> <start_id> <end_id>`
#[derive(Debug, Clone, clap::Args)]
pub struct ForwardCli {
    /// Source chat id
    #[arg(allow_negative_numbers = true)]
    pub source: i64,

    /// Destination chat id
    #[arg(allow_negative_numbers = true)]
    pub dest: i64,

    /// First message id (inclusive)
    pub start_id: i32,

    /// Last message id (inclusive)
    pub end_id: i32,

    /// Forward the whole range in one request
    #[arg(long)]
    pub bulk: bool,

    /// Pause after each forwarded message
    #[arg(long)]
    pub delay_ms: Option<u64>,
}

impl From<ForwardCli> for ForwardArgs {
    fn from(cli: ForwardCli) -> Self {
        Self {
            source: cli.source,
            dest: ChatRef::Id(cli.dest),
            start_id: cli.start_id,
            end_id: cli.end_id,
            bulk: cli.bulk,
            delay_ms: cli.delay_ms,
        }
    }
}

/// `forward_via_invite <source> <invite_link> <start_id> <end_id>`
#[derive(Debug, Clone, clap::Args)]
pub struct InviteCli {
    /// Source chat id
    #[arg(allow_negative_numbers = true)]
    pub source: i64,

    /// Destination invite link (t.me/+HASH or t.me/joinchat/HASH)
    pub link: String,

    /// First message id (inclusive)
    pub start_id: i32,

    /// Last message id (inclusive)
    pub end_id: i32,

    /// Pause after each forwarded message
    #[arg(long)]
    pub delay_ms: Option<u64>,
}

impl From<InviteCli> for ForwardArgs {
    fn from(cli: InviteCli) -> Self {
        Self {
            source: cli.source,
            dest: ChatRef::Invite(cli.link),
            start_id: cli.start_id,
            end_id: cli.end_id,
            bulk: false,
            delay_ms: cli.delay_ms,
        }
    }
}

impl ForwardArgs {
    pub fn request(&self) -> ForwardRequest {
        ForwardRequest {
            source: ChatRef::Id(self.source),
            dest: self.dest.clone(),
            start_id: self.start_id,
            end_id: self.end_id,
        }
    }
}

fn print_header(title: &str, args: &ForwardArgs, request: &ForwardRequest) {
    let line = "=".repeat(60);
    println!("\n{}", line);
    println!("📨 {}", title);
    println!("{}", line);
    println!("📤 From: {}", request.source);
    println!("📥 To: {}", request.dest);
    println!(
        "📊 Message range: {} to {}",
        args.start_id, args.end_id
    );
    if !args.bulk {
        println!("📝 Total messages: {}", request.len());
    }
    println!("{}\n", line);
}

/// CLI entry point. Returns the per-id summary; bulk mode returns an empty
/// summary since it has no per-id outcomes.
///
/// An empty range returns before any config, session or network access.
pub async fn run(args: ForwardArgs) -> Result<ForwardSummary> {
    let request = args.request();
    if request.is_empty() {
        println!(
            "📭 Empty range: {} to {}, nothing to forward",
            args.start_id, args.end_id
        );
        return Ok(ForwardSummary::default());
    }

    let config = Config::new();
    config.require_credentials()?;

    let title = match (&args.dest, args.bulk) {
        (_, true) => "Bulk Forwarding Messages",
        (ChatRef::Invite(_), false) => "Forwarding Messages via Invite Link",
        (ChatRef::Id(_), false) => "Forwarding Messages",
    };
    print_header(title, &args, &request);

    let _lock = SessionLock::acquire(&config)?;
    let client = get_client(&config).await?;

    let delay = Duration::from_millis(args.delay_ms.unwrap_or(config.forward_delay_ms));
    let forwarder = Forwarder::new(&client.client, delay);

    if args.bulk {
        let outcome = forwarder.run_bulk(&request).await?;
        if let Some(reason) = &outcome.failed {
            println!("❌ Error during bulk forward: {}\n", reason);
            return Ok(ForwardSummary::default());
        }
        info!(
            requested = outcome.requested,
            returned = outcome.returned,
            "Bulk forward finished"
        );
        println!("✅ Bulk forward completed!");
        println!(
            "📝 Note: {} requested, {} returned; deleted or empty messages are skipped silently\n",
            outcome.requested, outcome.returned
        );
        return Ok(ForwardSummary::default());
    }

    let summary = forwarder.run(&request).await?;
    println!("\n{}\n", summary);
    Ok(summary)
}
