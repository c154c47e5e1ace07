//! Upload video files as streaming videos.
//!
//! Files are sent as video documents with `supports_streaming`, so Telegram
//! plays them inline instead of offering a file download.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use grammers_client::types::peer::Peer;
use grammers_client::types::{Attribute, InputMessage};
use grammers_client::Client;
use tokio::fs::File;
use tracing::info;
use walkdir::WalkDir;

use crate::chat::{find_chat, peer_name};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::progress::{speed_mbps, to_mb, ProgressReader, ProgressReporter};
use crate::session::{get_client, SessionLock};

/// Nominal frame size sent with the video attribute; Telegram re-reads the
/// real dimensions from the stream.
const VIDEO_WIDTH: i32 = 1920;
const VIDEO_HEIGHT: i32 = 1080;

#[derive(Debug, Clone, clap::Args)]
pub struct UploadArgs {
    /// Video file, or a folder with `--folder`
    pub path: PathBuf,

    /// Chat id or username; falls back to `upload.default_chat`
    #[arg(short, long)]
    pub chat: Option<String>,

    /// Caption (defaults to the file name)
    #[arg(long)]
    pub caption: Option<String>,

    /// Upload every video in the folder
    #[arg(long)]
    pub folder: bool,
}

/// Timing of a finished upload.
#[derive(Debug, Clone, Copy)]
pub struct UploadStats {
    pub bytes: u64,
    pub elapsed: Duration,
}

impl UploadStats {
    pub fn speed_mbps(&self) -> f64 {
        speed_mbps(self.bytes, self.elapsed)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Caption to send: the given one, or the file name.
pub fn caption_for(path: &Path, caption: Option<&str>) -> String {
    match caption.map(str::trim) {
        Some(c) if !c.is_empty() => c.to_string(),
        _ => file_name(path),
    }
}

/// Video files directly inside `dir`, sorted by file name.
pub fn collect_videos(dir: &Path, config: &Config) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::InvalidArgument(format!(
            "{} is not a directory",
            dir.display()
        )));
    }

    let mut videos = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| Error::IoError(e.into()))?;
        if entry.file_type().is_file() && config.is_video(entry.path()) {
            videos.push(entry.into_path());
        }
    }
    videos.sort_by_key(|p| file_name(p));
    Ok(videos)
}

fn separator() -> String {
    "=".repeat(60)
}

fn print_done(stats: &UploadStats) {
    println!("✅ Upload complete!");
    println!("⏱️  Time: {:.2} seconds", stats.elapsed.as_secs_f64());
    println!("🚀 Speed: {:.2} MB/s", stats.speed_mbps());
    println!("{}\n", separator());
}

/// Upload one file as a streaming video.
pub async fn upload_video(
    client: &Client,
    chat: &Peer,
    path: &Path,
    caption: &str,
) -> Result<UploadStats> {
    let name = file_name(path);
    let size = tokio::fs::metadata(path).await?.len();
    let started = Instant::now();

    let file = File::open(path).await?;
    let mut reader = ProgressReader::new(file, ProgressReporter::new(size));
    let uploaded = client
        .upload_stream(&mut reader, size as usize, name.clone())
        .await?;
    println!();

    let message = InputMessage::new()
        .text(caption)
        .document(uploaded)
        .attribute(Attribute::Video {
            round_message: false,
            supports_streaming: true,
            duration: Duration::ZERO,
            w: VIDEO_WIDTH,
            h: VIDEO_HEIGHT,
        });
    client.send_message(chat, message).await?;

    let stats = UploadStats {
        bytes: size,
        elapsed: started.elapsed(),
    };
    info!(file = %name, bytes = size, secs = stats.elapsed.as_secs_f64(), "Uploaded video");
    Ok(stats)
}

/// Upload every video in a folder, in file name order.
pub async fn upload_folder(
    client: &Client,
    chat: &Peer,
    dir: &Path,
    config: &Config,
) -> Result<usize> {
    let videos = collect_videos(dir, config)?;
    let total = videos.len();
    println!("\n🎬 Found {} videos to upload", total);
    println!("📁 Folder: {}\n", dir.display());

    for (index, path) in videos.iter().enumerate() {
        let name = file_name(path);
        let size = tokio::fs::metadata(path).await?.len();

        println!("\n{}", separator());
        println!("📹 [{}/{}] Uploading: {}", index + 1, total, name);
        println!("📊 Size: {:.2} MB", to_mb(size));
        println!("{}", separator());

        let stats = upload_video(client, chat, path, &name).await?;
        print_done(&stats);
    }

    println!("\n🎉 All {} videos uploaded successfully!", total);
    Ok(total)
}

/// CLI entry point
pub async fn run(args: UploadArgs) -> Result<()> {
    let config = Config::new();
    let target = args
        .chat
        .clone()
        .or_else(|| config.upload_default_chat.clone())
        .ok_or_else(|| {
            Error::InvalidArgument("No chat given and upload.default_chat is not set".into())
        })?;

    if !args.path.exists() {
        return Err(Error::InvalidArgument(format!(
            "{} does not exist",
            args.path.display()
        )));
    }

    let _lock = SessionLock::acquire(&config)?;
    let client = get_client(&config).await?;
    let chat = find_chat(&client, &target).await?;

    if args.folder {
        upload_folder(&client, &chat, &args.path, &config).await?;
        return Ok(());
    }

    let caption = caption_for(&args.path, args.caption.as_deref());
    let size = tokio::fs::metadata(&args.path).await?.len();

    println!("\n{}", separator());
    println!("📹 Uploading: {}", file_name(&args.path));
    println!("📊 Size: {:.2} MB", to_mb(size));
    println!("💬 Caption: {}", caption);
    println!("📤 To chat: {}", peer_name(&chat));
    println!("{}", separator());

    let stats = upload_video(&client, &chat, &args.path, &caption).await?;
    print_done(&stats);
    Ok(())
}
