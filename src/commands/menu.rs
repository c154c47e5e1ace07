//! Interactive tdl menu.
//!
//! Reads from any `BufRead` and writes to any `Write`, so the prompts can be
//! driven by scripted input in tests. End of input behaves like "exit".

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use tracing::{error, info};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::links::{extract_chat_id, extract_message_id};
use crate::tdl::{count_exported, export_file_name, DownloadRequest, Tdl};

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    DownloadLink,
    DownloadRange,
    Exit,
}

/// Chat and id bounds as typed by the user, links already reduced to ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeInput {
    pub chat: String,
    pub start: String,
    pub end: String,
}

/// Non-hidden directories in `base`, sorted by name.
pub fn list_directories(base: &Path) -> Result<Vec<String>> {
    let mut dirs: Vec<String> = fs::read_dir(base)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| !name.starts_with('.'))
        .collect();
    dirs.sort();
    Ok(dirs)
}

pub struct Menu<R, W> {
    input: R,
    output: W,
    base: PathBuf,
}

impl<R: BufRead, W: Write> Menu<R, W> {
    pub fn new(input: R, output: W, base: impl Into<PathBuf>) -> Self {
        Self {
            input,
            output,
            base: base.into(),
        }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Prompt and read one trimmed line; `None` at end of input.
    fn ask(&mut self, prompt: &str) -> Result<Option<String>> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Prompt until a non-empty answer is given.
    fn ask_non_empty(&mut self, prompt: &str) -> Result<Option<String>> {
        loop {
            match self.ask(prompt)? {
                None => return Ok(None),
                Some(answer) if answer.is_empty() => {
                    writeln!(self.output, "❌ Value cannot be empty")?;
                }
                Some(answer) => return Ok(Some(answer)),
            }
        }
    }

    pub fn choose_action(&mut self) -> Result<Action> {
        loop {
            writeln!(self.output, "\n{}", "=".repeat(50))?;
            writeln!(self.output, "📥 TDL DOWNLOADER")?;
            writeln!(self.output, "{}", "=".repeat(50))?;
            writeln!(self.output, "1. Download by message link")?;
            writeln!(self.output, "2. Download message range")?;
            writeln!(self.output, "3. Exit")?;

            match self.ask("\nChoose an option (1-3): ")?.as_deref() {
                None | Some("3") => return Ok(Action::Exit),
                Some("1") => return Ok(Action::DownloadLink),
                Some("2") => return Ok(Action::DownloadRange),
                Some(other) => writeln!(self.output, "❌ Invalid choice: {}", other)?,
            }
        }
    }

    fn create_folder(&mut self) -> Result<Option<PathBuf>> {
        let Some(name) = self.ask_non_empty("Folder name: ")? else {
            return Ok(None);
        };
        let path = self.base.join(&name);
        fs::create_dir_all(&path)?;
        writeln!(self.output, "✅ Using folder: {}", name)?;
        Ok(Some(path))
    }

    fn pick_existing(&mut self, dirs: &[String]) -> Result<Option<PathBuf>> {
        writeln!(self.output, "\n📁 Existing folders:")?;
        for (i, dir) in dirs.iter().enumerate() {
            writeln!(self.output, "{}. {}", i + 1, dir)?;
        }

        loop {
            let Some(answer) = self.ask("Folder number or name: ")? else {
                return Ok(None);
            };
            let chosen = match answer.parse::<usize>() {
                Ok(n) if (1..=dirs.len()).contains(&n) => Some(&dirs[n - 1]),
                _ => dirs.iter().find(|d| **d == answer),
            };
            match chosen {
                Some(dir) => {
                    writeln!(self.output, "✅ Using folder: {}", dir)?;
                    return Ok(Some(self.base.join(dir)));
                }
                None => writeln!(self.output, "❌ No such folder: {}", answer)?,
            }
        }
    }

    /// Ask for a download folder. `None` when input ended.
    pub fn select_folder(&mut self) -> Result<Option<PathBuf>> {
        loop {
            writeln!(self.output, "\n1. Create new folder")?;
            writeln!(self.output, "2. Use existing folder")?;
            match self.ask("Choose (1-2): ")?.as_deref() {
                None => return Ok(None),
                Some("1") => return self.create_folder(),
                Some("2") => {
                    let dirs = list_directories(&self.base)?;
                    if dirs.is_empty() {
                        writeln!(self.output, "📭 No folders yet, creating a new one")?;
                        return self.create_folder();
                    }
                    return self.pick_existing(&dirs);
                }
                Some(other) => writeln!(self.output, "❌ Invalid choice: {}", other)?,
            }
        }
    }

    pub fn ask_link(&mut self) -> Result<Option<String>> {
        self.ask_non_empty("Message link: ")
    }

    /// Chat id and bounds; each may be given as a message link.
    pub fn ask_range(&mut self) -> Result<Option<RangeInput>> {
        let Some(chat) = self.ask_non_empty("Chat id or link: ")? else {
            return Ok(None);
        };
        let Some(start) = self.ask_non_empty("Start message id or link: ")? else {
            return Ok(None);
        };
        let Some(end) = self.ask_non_empty("End message id or link: ")? else {
            return Ok(None);
        };
        Ok(Some(RangeInput {
            chat: extract_chat_id(&chat),
            start: extract_message_id(&start),
            end: extract_message_id(&end),
        }))
    }

    async fn download_link(&mut self, tdl: &Tdl) -> Result<bool> {
        let Some(link) = self.ask_link()? else {
            return Ok(false);
        };
        let Some(folder) = self.select_folder()? else {
            return Ok(false);
        };
        let request = DownloadRequest {
            links: vec![link],
            out_dir: folder,
            ..Default::default()
        };
        tdl.download(&request).await?;
        writeln!(self.output, "✅ Saved to {}", request.out_dir.display())?;
        Ok(true)
    }

    async fn download_exported(&mut self, tdl: &Tdl, export: &Path, folder: &Path) -> Result<()> {
        let count = count_exported(export)?;
        writeln!(self.output, "📊 Messages found: {}", count)?;
        tdl.download_export(export, folder).await
    }

    async fn download_range(&mut self, tdl: &Tdl) -> Result<bool> {
        let Some(range) = self.ask_range()? else {
            return Ok(false);
        };
        let Some(folder) = self.select_folder()? else {
            return Ok(false);
        };

        let export = self
            .base
            .join(export_file_name(&range.chat, &range.start, &range.end));
        writeln!(
            self.output,
            "📤 Exporting messages {}..{} of chat {}",
            range.start, range.end, range.chat
        )?;
        tdl.export_range(&range.chat, &range.start, &range.end, &export)
            .await?;

        let result = self.download_exported(tdl, &export, &folder).await;

        if let Err(e) = fs::remove_file(&export) {
            if e.kind() != io::ErrorKind::NotFound {
                return Err(Error::IoError(e));
            }
        }
        result?;

        writeln!(self.output, "✅ Saved to {}", folder.display())?;
        Ok(true)
    }

    /// Menu loop. Failed downloads are reported and the menu continues.
    pub async fn run(&mut self, tdl: &Tdl) -> Result<()> {
        loop {
            write!(self.output, "{}", CLEAR_SCREEN)?;
            let action = self.choose_action()?;
            let outcome = match action {
                Action::Exit => break,
                Action::DownloadLink => self.download_link(tdl).await,
                Action::DownloadRange => self.download_range(tdl).await,
            };

            match outcome {
                Ok(true) => info!(?action, "Menu download finished"),
                Ok(false) => break,
                Err(Error::IoError(e)) => return Err(Error::IoError(e)),
                Err(e) => {
                    error!(error = %e, "Menu download failed");
                    writeln!(self.output, "❌ {}", e)?;
                }
            }

            if self.ask("\nPress Enter to continue...")?.is_none() {
                break;
            }
        }
        writeln!(self.output, "👋 Bye")?;
        Ok(())
    }
}

pub async fn run(tdl_path: Option<PathBuf>) -> Result<()> {
    let config = Config::new();
    let tdl = Tdl::locate(tdl_path.as_deref(), config.tdl_path.as_deref())?;
    let base = std::env::current_dir()?;

    let stdin = io::stdin();
    let mut menu = Menu::new(stdin.lock(), io::stdout(), base);
    menu.run(&tdl).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::tempdir;

    fn menu(input: &str, base: &Path) -> Menu<Cursor<Vec<u8>>, Vec<u8>> {
        Menu::new(Cursor::new(input.as_bytes().to_vec()), Vec::new(), base)
    }

    fn output(menu: Menu<Cursor<Vec<u8>>, Vec<u8>>) -> String {
        String::from_utf8(menu.into_output()).unwrap()
    }

    #[test]
    fn invalid_choice_reprompts() {
        let dir = tempdir().unwrap();
        let mut m = menu("9\n2\n", dir.path());
        assert_eq!(m.choose_action().unwrap(), Action::DownloadRange);
        assert!(output(m).contains("Invalid choice: 9"));
    }

    #[test]
    fn end_of_input_exits() {
        let dir = tempdir().unwrap();
        let mut m = menu("", dir.path());
        assert_eq!(m.choose_action().unwrap(), Action::Exit);
    }

    #[test]
    fn list_directories_skips_hidden_and_files() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("videos")).unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        fs::create_dir(dir.path().join("audio")).unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();

        assert_eq!(list_directories(dir.path()).unwrap(), vec!["audio", "videos"]);
    }

    #[test]
    fn create_new_folder_rejects_empty_name() {
        let dir = tempdir().unwrap();
        let mut m = menu("1\n\nlectures\n", dir.path());

        let folder = m.select_folder().unwrap().unwrap();
        assert_eq!(folder, dir.path().join("lectures"));
        assert!(folder.is_dir());
        assert!(output(m).contains("cannot be empty"));
    }

    #[test]
    fn pick_existing_folder_by_number_or_name() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("alpha")).unwrap();
        fs::create_dir(dir.path().join("beta")).unwrap();

        let mut by_number = menu("2\n2\n", dir.path());
        assert_eq!(
            by_number.select_folder().unwrap(),
            Some(dir.path().join("beta"))
        );

        let mut by_name = menu("2\n7\ngamma\nalpha\n", dir.path());
        assert_eq!(
            by_name.select_folder().unwrap(),
            Some(dir.path().join("alpha"))
        );
        let text = output(by_name);
        assert!(text.contains("No such folder: 7"));
        assert!(text.contains("No such folder: gamma"));
    }

    #[test]
    fn existing_without_folders_falls_back_to_create() {
        let dir = tempdir().unwrap();
        let mut m = menu("2\nfresh\n", dir.path());
        assert_eq!(m.select_folder().unwrap(), Some(dir.path().join("fresh")));
    }

    #[test]
    fn range_accepts_links() {
        let dir = tempdir().unwrap();
        let mut m = menu(
            "https://t.me/c/1234567890/5\nhttps://t.me/c/1234567890/100\n200\n",
            dir.path(),
        );
        assert_eq!(
            m.ask_range().unwrap(),
            Some(RangeInput {
                chat: "1234567890".into(),
                start: "100".into(),
                end: "200".into(),
            })
        );
    }

    #[tokio::test]
    async fn download_failure_is_reported_and_menu_continues() {
        let dir = tempdir().unwrap();
        let tdl = Tdl::new(dir.path().join("missing-tdl"));
        let mut m = menu("1\nhttps://t.me/c/1/2\n1\nout\n\n3\n", dir.path());

        m.run(&tdl).await.unwrap();

        let text = output(m);
        assert!(text.contains("failed to start tdl"));
        assert!(text.contains("👋 Bye"));
    }
}
