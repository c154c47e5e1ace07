//! Range forwarding between chats.
//!
//! Walks an inclusive message-id range one id at a time: fetch from the
//! source, forward to the destination, record exactly one outcome per id.
//! Per-message failures are counted and never stop the walk. A fixed delay
//! after each successful forward keeps the session under Telegram's flood
//! limits; nothing is retried.

use std::fmt;
use std::ops::RangeInclusive;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

use crate::chat::ChatRef;
use crate::error::{Error, Result};
use crate::metrics;
use crate::service::{ChatService, JoinOutcome};

/// Maximum length of a failure reason shown to the user.
pub const REASON_LIMIT: usize = 50;

/// What to forward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardRequest {
    pub source: ChatRef,
    pub dest: ChatRef,
    pub start_id: i32,
    pub end_id: i32,
}

impl ForwardRequest {
    pub fn ids(&self) -> RangeInclusive<i32> {
        self.start_id..=self.end_id
    }

    /// Number of ids in the range; zero when `end_id < start_id`.
    pub fn len(&self) -> usize {
        if self.end_id < self.start_id {
            0
        } else {
            (i64::from(self.end_id) - i64::from(self.start_id) + 1) as usize
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotFound,
}

/// Result for a single message id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForwardOutcome {
    Forwarded,
    Skipped(SkipReason),
    Failed(String),
}

impl ForwardOutcome {
    fn from_error(err: &Error) -> Self {
        match err {
            Error::MessageNotFound(_) => ForwardOutcome::Skipped(SkipReason::NotFound),
            other => ForwardOutcome::Failed(truncate_reason(&other.to_string())),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ForwardOutcome::Forwarded => "forwarded",
            ForwardOutcome::Skipped(_) => "skipped",
            ForwardOutcome::Failed(_) => "failed",
        }
    }
}

impl fmt::Display for ForwardOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForwardOutcome::Forwarded => write!(f, "Forwarded successfully"),
            ForwardOutcome::Skipped(SkipReason::NotFound) => {
                write!(f, "Skipped (deleted or not found)")
            }
            ForwardOutcome::Failed(reason) => write!(f, "Failed - {}", reason),
        }
    }
}

/// Per-outcome counts over a range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ForwardSummary {
    pub forwarded: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl ForwardSummary {
    pub fn record(&mut self, outcome: &ForwardOutcome) {
        match outcome {
            ForwardOutcome::Forwarded => self.forwarded += 1,
            ForwardOutcome::Skipped(_) => self.skipped += 1,
            ForwardOutcome::Failed(_) => self.failed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.forwarded + self.skipped + self.failed
    }
}

impl fmt::Display for ForwardSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let line = "=".repeat(60);
        writeln!(f, "{}", line)?;
        writeln!(f, "📊 Forwarding Summary")?;
        writeln!(f, "{}", line)?;
        writeln!(f, "✅ Successful: {}", self.forwarded)?;
        writeln!(f, "❌ Failed: {}", self.failed)?;
        writeln!(f, "⊘ Skipped: {}", self.skipped)?;
        writeln!(f, "📝 Total: {}", self.total())?;
        write!(f, "{}", line)
    }
}

/// Outcome of a single batch request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkOutcome {
    pub requested: usize,
    /// Messages the server echoed back. Informational only: deleted ids are
    /// dropped without an error, so this is not a per-id confirmation.
    pub returned: usize,
    /// Truncated reason when the batch request itself was rejected.
    pub failed: Option<String>,
}

/// Cut a failure reason to [`REASON_LIMIT`] characters.
pub fn truncate_reason(reason: &str) -> String {
    reason.chars().take(REASON_LIMIT).collect()
}

/// Sequential forwarder bound to one chat service.
pub struct Forwarder<'a, S: ChatService> {
    service: &'a S,
    delay: Duration,
}

impl<'a, S: ChatService> Forwarder<'a, S> {
    pub fn new(service: &'a S, delay: Duration) -> Self {
        Self { service, delay }
    }

    /// Resolve the destination, joining through an invite link when needed.
    pub async fn resolve_destination(&self, dest: &ChatRef) -> Result<S::Chat> {
        let link = match dest {
            ChatRef::Id(_) => return self.service.resolve(dest).await,
            ChatRef::Invite(link) => link,
        };

        match self.service.join_via_invite(link).await? {
            JoinOutcome::Joined(chat) => {
                info!(chat = %self.service.chat_title(&chat), "Joined destination chat");
                Ok(chat)
            }
            JoinOutcome::AlreadyMember => {
                info!("Already a member of destination chat");
                self.service.resolve_invite(link).await
            }
            JoinOutcome::RequestPending => {
                info!("Join request already pending for destination chat");
                self.service.resolve_invite(link).await
            }
        }
    }

    /// Fetch and forward a single id.
    pub async fn forward_one(&self, source: &S::Chat, dest: &S::Chat, id: i32) -> ForwardOutcome {
        match self.try_forward(source, dest, id).await {
            Ok(()) => ForwardOutcome::Forwarded,
            Err(e) => ForwardOutcome::from_error(&e),
        }
    }

    async fn try_forward(&self, source: &S::Chat, dest: &S::Chat, id: i32) -> Result<()> {
        if self.service.get_message(source, id).await?.is_none() {
            return Err(Error::MessageNotFound(id));
        }
        self.service.forward(source, dest, id).await
    }

    /// Walk `start_id..=end_id` in ascending order.
    pub async fn forward_range(
        &self,
        source: &S::Chat,
        dest: &S::Chat,
        start_id: i32,
        end_id: i32,
    ) -> ForwardSummary {
        let mut summary = ForwardSummary::default();

        for id in start_id..=end_id {
            let outcome = self.forward_one(source, dest, id).await;
            report(id, &outcome);
            summary.record(&outcome);

            if outcome == ForwardOutcome::Forwarded {
                sleep(self.delay).await;
            }
        }

        summary
    }

    /// Resolve both chats and walk the request's range.
    ///
    /// An empty range returns an all-zero summary without touching the
    /// service. Resolution failures are returned as errors; everything after
    /// that is counted in the summary.
    pub async fn run(&self, request: &ForwardRequest) -> Result<ForwardSummary> {
        if request.is_empty() {
            return Ok(ForwardSummary::default());
        }

        let source = self.service.resolve(&request.source).await?;
        let dest = self.resolve_destination(&request.dest).await?;
        println!(
            "✅ Source chat verified: {}",
            self.service.chat_title(&source)
        );
        println!(
            "✅ Destination chat verified: {}\n",
            self.service.chat_title(&dest)
        );

        Ok(self
            .forward_range(&source, &dest, request.start_id, request.end_id)
            .await)
    }

    /// Forward the whole range in one request. No per-id outcomes.
    pub async fn run_bulk(&self, request: &ForwardRequest) -> Result<BulkOutcome> {
        let ids: Vec<i32> = request.ids().collect();
        if ids.is_empty() {
            return Ok(BulkOutcome::default());
        }

        let source = self.service.resolve(&request.source).await?;
        let dest = self.resolve_destination(&request.dest).await?;

        println!("🚀 Forwarding {} messages in bulk...", ids.len());
        let outcome = match self.service.forward_batch(&source, &dest, &ids).await {
            Ok(returned) => BulkOutcome {
                requested: ids.len(),
                returned,
                failed: None,
            },
            Err(e) => {
                let reason = truncate_reason(&e.to_string());
                warn!(requested = ids.len(), %reason, "Bulk forward failed");
                metrics::record_forward_outcome("failed");
                BulkOutcome {
                    requested: ids.len(),
                    returned: 0,
                    failed: Some(reason),
                }
            }
        };

        Ok(outcome)
    }
}

fn report(id: i32, outcome: &ForwardOutcome) {
    metrics::record_forward_outcome(outcome.label());
    match outcome {
        ForwardOutcome::Forwarded => {
            info!(id, "Forwarded message");
            println!("✅ Message {}: {}", id, outcome);
        }
        ForwardOutcome::Skipped(_) => {
            info!(id, "Skipped missing message");
            println!("⊘ Message {}: {}", id, outcome);
        }
        ForwardOutcome::Failed(reason) => {
            warn!(id, %reason, "Failed to forward message");
            println!("❌ Message {}: {}", id, outcome);
        }
    }
}
