//! Download messages through tdl.

use std::path::PathBuf;

use tracing::warn;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::links::MessageLink;
use crate::tdl::{read_links_file, DownloadRequest, Tdl};

/// Default output folder, named after the threads batch it was built for.
pub const DEFAULT_OUT_DIR: &str = "mixed_threads_messages";

#[derive(Debug, Clone, Default, clap::Args)]
pub struct DownloadArgs {
    /// Message link to download (repeatable)
    #[arg(short = 'u', long = "link")]
    pub links: Vec<String>,

    /// File with one link per line
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Output directory
    #[arg(short = 'd', long = "out")]
    pub out_dir: Option<PathBuf>,

    /// Download whole albums
    #[arg(long)]
    pub group: bool,

    /// Use takeout session
    #[arg(long)]
    pub takeout: bool,

    /// Download newest first
    #[arg(long)]
    pub desc: bool,

    /// Only check that tdl is available
    #[arg(long)]
    pub check: bool,

    /// Run `tdl login` before downloading
    #[arg(long)]
    pub login: bool,

    /// Path to the tdl executable
    #[arg(long)]
    pub tdl_path: Option<PathBuf>,
}

impl DownloadArgs {
    /// Links from `--link` or `--file`; the two are mutually exclusive.
    pub fn collect_links(&self) -> Result<Vec<String>> {
        let links = match (&self.file, self.links.is_empty()) {
            (Some(_), false) => {
                return Err(Error::InvalidArgument(
                    "Use either --link or --file, not both".to_string(),
                ))
            }
            (Some(path), true) => read_links_file(path)?,
            (None, _) => self.links.clone(),
        };
        if links.is_empty() {
            return Err(Error::InvalidArgument(
                "No links provided. Use --link or --file.".to_string(),
            ));
        }
        Ok(links)
    }

    pub fn request(&self, links: Vec<String>) -> DownloadRequest {
        DownloadRequest {
            links,
            out_dir: self
                .out_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUT_DIR)),
            group: self.group,
            takeout: self.takeout,
            desc: self.desc,
        }
    }
}

/// Pair each link with its parsed form. Unparseable links get `None` and are
/// passed to tdl unchanged.
pub fn describe_links(links: &[String]) -> Vec<(String, Option<MessageLink>)> {
    links
        .iter()
        .map(|l| (l.clone(), l.parse::<MessageLink>().ok()))
        .collect()
}

pub async fn run(args: DownloadArgs) -> Result<()> {
    let config = Config::new();
    let tdl = Tdl::locate(args.tdl_path.as_deref(), config.tdl_path.as_deref())?;

    if args.check {
        let version = tdl.version().await?;
        println!("✅ tdl found: {}", tdl.path().display());
        println!("{}", version.trim());
        return Ok(());
    }

    let links = args.collect_links()?;
    let request = args.request(links);

    println!("📁 Output: {}", request.out_dir.display());
    println!("🔗 Links: {}", request.links.len());
    for (raw, parsed) in describe_links(&request.links) {
        match parsed {
            Some(MessageLink {
                thread: Some(thread),
                message,
                ..
            }) => println!("   thread {} / message {}: {}", thread, message, raw),
            Some(link) => println!("   message {}: {}", link.message, raw),
            None => {
                warn!(link = %raw, "Not a recognised message link, passing to tdl as is");
                println!("   ⚠️  {}", raw);
            }
        }
    }

    if args.login {
        tdl.login().await?;
    }

    tdl.download(&request).await?;
    println!("\n✅ Download completed: {}", request.out_dir.display());
    Ok(())
}
