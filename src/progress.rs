//! Transfer progress for uploads.
//!
//! A [`ProgressReporter`] belongs to exactly one file transfer and owns its
//! timing state. [`ProgressReader`] wraps the file being uploaded and feeds
//! the reporter as bytes are read.

use std::fmt;
use std::io::Write;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, ReadBuf};

use crate::metrics;

/// Minimum time between two progress lines.
pub const REPORT_INTERVAL: Duration = Duration::from_millis(500);

const MB: f64 = 1024.0 * 1024.0;

pub fn to_mb(bytes: u64) -> f64 {
    bytes as f64 / MB
}

/// Average speed in MB/s, zero when no time has passed.
pub fn speed_mbps(bytes: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        to_mb(bytes) / secs
    } else {
        0.0
    }
}

/// One rendered progress sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressLine {
    pub percent: f64,
    pub current_mb: f64,
    pub total_mb: f64,
    pub speed_mbps: f64,
}

impl fmt::Display for ProgressLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "🚀 Progress: {:.1}% | {:.1}/{:.1} MB | Speed: {:.2} MB/s",
            self.percent, self.current_mb, self.total_mb, self.speed_mbps
        )
    }
}

/// Throttled progress state for a single transfer.
#[derive(Debug)]
pub struct ProgressReporter {
    total: u64,
    started_at: Instant,
    last_report: Option<Instant>,
    interval: Duration,
}

impl ProgressReporter {
    pub fn new(total: u64) -> Self {
        Self::starting_at(total, Instant::now())
    }

    pub fn starting_at(total: u64, started_at: Instant) -> Self {
        Self {
            total,
            started_at,
            last_report: None,
            interval: REPORT_INTERVAL,
        }
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Returns a line to print, or `None` when the previous report is too
    /// recent. The final sample (`current >= total`) is always reported.
    pub fn update_at(&mut self, current: u64, now: Instant) -> Option<ProgressLine> {
        let finished = current >= self.total;
        if let Some(last) = self.last_report {
            if !finished && now.saturating_duration_since(last) < self.interval {
                return None;
            }
        }
        self.last_report = Some(now);

        let percent = if self.total == 0 {
            100.0
        } else {
            current as f64 / self.total as f64 * 100.0
        };

        Some(ProgressLine {
            percent,
            current_mb: to_mb(current),
            total_mb: to_mb(self.total),
            speed_mbps: speed_mbps(current, now.saturating_duration_since(self.started_at)),
        })
    }

    pub fn update(&mut self, current: u64) -> Option<ProgressLine> {
        self.update_at(current, Instant::now())
    }
}

/// `AsyncRead` adapter that reports how much of the inner stream was read.
pub struct ProgressReader<R> {
    inner: R,
    read: u64,
    reporter: ProgressReporter,
    echo: bool,
}

impl<R> ProgressReader<R> {
    /// Wrap `inner`, printing progress to stdout.
    pub fn new(inner: R, reporter: ProgressReporter) -> Self {
        Self {
            inner,
            read: 0,
            reporter,
            echo: true,
        }
    }

    /// Wrap `inner` without printing.
    pub fn quiet(inner: R, reporter: ProgressReporter) -> Self {
        Self {
            echo: false,
            ..Self::new(inner, reporter)
        }
    }

    pub fn bytes_read(&self) -> u64 {
        self.read
    }

    pub fn reporter(&self) -> &ProgressReporter {
        &self.reporter
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for ProgressReader<R> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        let this = self.get_mut();
        let before = buf.filled().len();

        let poll = Pin::new(&mut this.inner).poll_read(cx, buf);
        if let Poll::Ready(Ok(())) = &poll {
            let chunk = (buf.filled().len() - before) as u64;
            if chunk > 0 {
                this.read += chunk;
                metrics::record_upload_bytes(chunk);
                if let Some(line) = this.reporter.update(this.read) {
                    if this.echo {
                        print!("\r{}", line);
                        let _ = std::io::stdout().flush();
                    }
                }
            }
        }
        poll
    }
}
