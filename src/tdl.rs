//! Wrapper around the external `tdl` downloader.
//!
//! Only locates the executable, builds argument lists and runs it; all
//! Telegram work happens inside tdl with its own login.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{Error, Result};

#[cfg(windows)]
const TDL_BINARY: &str = "tdl.exe";
#[cfg(not(windows))]
const TDL_BINARY: &str = "tdl";

/// Options for `tdl download`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadRequest {
    pub links: Vec<String>,
    pub out_dir: PathBuf,
    /// Download whole albums
    pub group: bool,
    pub takeout: bool,
    /// Newest first
    pub desc: bool,
}

impl DownloadRequest {
    pub fn args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["download".into()];
        for link in &self.links {
            args.push("-u".into());
            args.push(link.into());
        }
        args.push("-d".into());
        args.push(self.out_dir.clone().into_os_string());
        if self.group {
            args.push("--group".into());
        }
        if self.takeout {
            args.push("--takeout".into());
        }
        if self.desc {
            args.push("--desc".into());
        }
        args
    }
}

/// Shape of the JSON written by `tdl chat export`.
#[derive(Debug, Deserialize)]
struct ExportFile {
    #[serde(default)]
    messages: Vec<serde_json::Value>,
}

/// Number of messages listed in a `tdl chat export` file.
pub fn count_exported(path: &Path) -> Result<usize> {
    let content = fs::read_to_string(path)?;
    let export: ExportFile = serde_json::from_str(&content)?;
    Ok(export.messages.len())
}

/// Read links from a file, one per line, skipping blank lines.
pub fn read_links_file(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Err(Error::InvalidArgument(format!(
            "Link file not found: {}",
            path.display()
        )));
    }
    let content = fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

/// Places tdl is looked for, in order, before falling back to PATH.
fn candidate_paths(explicit: Option<&Path>, configured: Option<&Path>) -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(p) = explicit {
        candidates.push(p.to_path_buf());
    }
    if let Some(p) = env::var_os("TDL_PATH") {
        candidates.push(PathBuf::from(p));
    }
    if let Some(p) = configured {
        candidates.push(p.to_path_buf());
    }
    if let Ok(cwd) = env::current_dir() {
        candidates.push(cwd.join("tdl").join("bin").join(TDL_BINARY));
        candidates.push(cwd.join("bin").join(TDL_BINARY));
    }
    candidates
}

fn search_path(binary: &str) -> Option<PathBuf> {
    let paths = env::var_os("PATH")?;
    env::split_paths(&paths)
        .map(|dir| dir.join(binary))
        .find(|p| p.is_file())
}

/// Handle to a located tdl executable.
#[derive(Debug, Clone)]
pub struct Tdl {
    path: PathBuf,
}

impl Tdl {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Find tdl: explicit path, `TDL_PATH`, config, `./tdl/bin`, `./bin`, PATH.
    pub fn locate(explicit: Option<&Path>, configured: Option<&Path>) -> Result<Self> {
        let found = candidate_paths(explicit, configured)
            .into_iter()
            .find(|p| p.is_file())
            .or_else(|| search_path(TDL_BINARY));

        match found {
            Some(path) => {
                let path = fs::canonicalize(&path).unwrap_or(path);
                debug!(path = %path.display(), "Using tdl executable");
                Ok(Self { path })
            }
            None => Err(Error::Downloader(
                "tdl executable not found. Set TDL_PATH or place it in ./tdl/bin or on PATH."
                    .to_string(),
            )),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run tdl with inherited stdio.
    async fn run(&self, args: &[OsString]) -> Result<()> {
        info!(
            "Running {} {}",
            self.path.display(),
            args.iter()
                .map(|a| a.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" ")
        );

        let status = Command::new(&self.path)
            .args(args)
            .status()
            .await
            .map_err(|e| Error::Downloader(format!("failed to start tdl: {}", e)))?;

        if status.success() {
            Ok(())
        } else {
            Err(Error::Downloader(format!(
                "tdl returned non-zero exit code: {}",
                status.code().unwrap_or(-1)
            )))
        }
    }

    /// `tdl version`, captured.
    pub async fn version(&self) -> Result<String> {
        let output = Command::new(&self.path)
            .arg("version")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| Error::Downloader(format!("failed to start tdl: {}", e)))?;

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));

        if output.status.success() {
            Ok(text)
        } else {
            Err(Error::Downloader(format!("Failed to run tdl: {}", text.trim())))
        }
    }

    /// Interactive login by code.
    pub async fn login(&self) -> Result<()> {
        self.run(&["login".into(), "-T".into(), "code".into()]).await
    }

    pub async fn download(&self, request: &DownloadRequest) -> Result<()> {
        if request.links.is_empty() {
            return Err(Error::InvalidArgument(
                "No links provided. Use --link or --file.".to_string(),
            ));
        }
        self.run(&request.args()).await
    }

    /// Export the ids `start..=end` of a chat to a JSON file.
    pub async fn export_range(&self, chat: &str, start: &str, end: &str, out: &Path) -> Result<()> {
        self.run(&export_args(chat, start, end, out)).await
    }

    /// Download everything listed in an export file.
    pub async fn download_export(&self, export: &Path, out_dir: &Path) -> Result<()> {
        self.run(&[
            "dl".into(),
            "-f".into(),
            export.as_os_str().to_owned(),
            "-d".into(),
            out_dir.as_os_str().to_owned(),
        ])
        .await
    }
}

fn export_args(chat: &str, start: &str, end: &str, out: &Path) -> Vec<OsString> {
    vec![
        "chat".into(),
        "export".into(),
        "-c".into(),
        chat.into(),
        "-T".into(),
        "id".into(),
        "-i".into(),
        format!("{},{}", start, end).into(),
        "-o".into(),
        out.as_os_str().to_owned(),
    ]
}

/// Name of the temporary export file for a range download.
pub fn export_file_name(chat: &str, start: &str, end: &str) -> String {
    format!("export_{}_{}_{}.json", chat, start, end)
}
