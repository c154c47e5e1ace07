//! Session management for Telegram client
//!
//! Provides:
//! - File-based session locking to prevent parallel execution
//! - Session file validation
//! - Client creation with proper configuration

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fs2::FileExt;
use grammers_client::Client;
use grammers_mtsender::{SenderPool, SenderPoolHandle};
use grammers_session::storages::SqliteSession;

use crate::config::Config;
use crate::error::{Error, Result};

/// Session lock guard that ensures exclusive access to the Telegram session.
pub struct SessionLock {
    path: PathBuf,
    lock_file: Option<File>,
}

impl SessionLock {
    /// Acquire an exclusive lock on the session.
    pub fn acquire(config: &Config) -> Result<Self> {
        Self::acquire_at(config.lock_file())
    }

    pub fn acquire_at(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let lock_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .map_err(|e| Error::LockError(format!("Failed to open lock file: {}", e)))?;

        match lock_file.try_lock_exclusive() {
            Ok(()) => Ok(Self {
                path,
                lock_file: Some(lock_file),
            }),
            Err(_) => {
                eprintln!(
                    r#"
⚠️  ERROR: the Telegram session is already in use by another command!

Telegram operations on one session must run one at a time.
Wait for the other command to finish and try again.
"#
                );
                Err(Error::SessionLocked)
            }
        }
    }

    /// Release the lock manually
    pub fn release(&mut self) {
        if let Some(file) = self.lock_file.take() {
            let _ = file.unlock();
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

impl Drop for SessionLock {
    fn drop(&mut self) {
        self.release();
    }
}

/// Check if the session file exists.
pub fn check_session_exists(config: &Config) -> Result<()> {
    let session_file = config.session_file();

    if !Path::new(&session_file).exists() {
        eprintln!(
            r#"
⚠️  ERROR: session file '{}' not found!

To create it:
1. Run: cargo run --bin init_session
2. Enter the code Telegram sends you
"#,
            session_file
        );
        return Err(Error::SessionNotFound(session_file));
    }

    Ok(())
}

/// Open (or create) the sqlite-backed session file.
fn open_session(config: &Config) -> Result<Arc<SqliteSession>> {
    let session_file = config.session_file();
    let session = SqliteSession::open(&session_file)
        .map_err(|e| Error::SessionNotFound(format!("{}: {}", session_file, e)))?;
    Ok(Arc::new(session))
}

/// Holder for SenderPool components and Client
pub struct TelegramClient {
    pub client: Client,
    pub handle: SenderPoolHandle,
    runner_handle: tokio::task::JoinHandle<()>,
}

impl TelegramClient {
    /// Create a new TelegramClient from session
    pub async fn connect(session: Arc<SqliteSession>, api_id: i32) -> Result<Self> {
        let pool = SenderPool::new(session, api_id);
        let client = Client::new(&pool);

        let SenderPool { runner, handle, .. } = pool;

        let runner_handle = tokio::spawn(async move {
            runner.run().await;
        });

        Ok(Self {
            client,
            handle,
            runner_handle,
        })
    }
}

impl Drop for TelegramClient {
    fn drop(&mut self) {
        self.runner_handle.abort();
    }
}

// Implement Deref to allow using TelegramClient as &Client
impl std::ops::Deref for TelegramClient {
    type Target = Client;

    fn deref(&self) -> &Self::Target {
        &self.client
    }
}

/// Create and connect a Telegram client with an existing, authorized session.
pub async fn get_client(config: &Config) -> Result<TelegramClient> {
    config.require_credentials()?;
    check_session_exists(config)?;
    let session = open_session(config)?;
    let client = TelegramClient::connect(session, config.api_id).await?;

    if !client.is_authorized().await? {
        return Err(Error::SessionNotFound(format!(
            "{} is not authorized, run init_session",
            config.session_file()
        )));
    }

    Ok(client)
}

/// Create a Telegram client for initialization (no session check).
pub async fn get_client_for_init(config: &Config) -> Result<TelegramClient> {
    config.require_credentials()?;
    let session = open_session(config)?;
    TelegramClient::connect(session, config.api_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{LazyLock, Mutex};
    use tempfile::tempdir;

    static WORKDIR_LOCK: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

    struct DirGuard {
        original: PathBuf,
    }

    impl DirGuard {
        fn change_to(path: &Path) -> Self {
            let original = env::current_dir().expect("current dir");
            env::set_current_dir(path).expect("set current dir");
            Self { original }
        }
    }

    impl Drop for DirGuard {
        fn drop(&mut self) {
            let _ = env::set_current_dir(&self.original);
        }
    }

    #[test]
    fn release_removes_lock_file() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("relay.lock");

        let mut lock = SessionLock::acquire_at(&path).expect("lock");
        assert!(path.exists());
        lock.release();
        assert!(!path.exists());
    }

    #[test]
    fn lock_dropped_releases_automatically() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("relay.lock");

        {
            let _lock = SessionLock::acquire_at(&path).expect("lock");
            assert!(path.exists());
        }
        assert!(!path.exists());
    }

    #[test]
    fn double_release_is_safe() {
        let temp = tempdir().expect("tempdir");
        let mut lock = SessionLock::acquire_at(temp.path().join("relay.lock")).expect("lock");
        lock.release();
        lock.release();
    }

    #[test]
    fn lock_can_be_reacquired_after_release() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("relay.lock");

        let mut first = SessionLock::acquire_at(&path).expect("first lock");
        first.release();

        let second = SessionLock::acquire_at(&path);
        assert!(second.is_ok());
    }

    #[test]
    fn acquire_uses_configured_session_name() {
        let _lock = WORKDIR_LOCK.lock().unwrap();
        let temp = tempdir().expect("tempdir");
        let _guard = DirGuard::change_to(temp.path());

        let mut config = Config::defaults();
        config.session_name = "video_uploader".into();

        let lock = SessionLock::acquire(&config).expect("lock");
        assert!(PathBuf::from("video_uploader.lock").exists());
        drop(lock);
        assert!(!PathBuf::from("video_uploader.lock").exists());
    }

    #[test]
    fn check_session_exists_reports_missing_and_success() {
        let _lock = WORKDIR_LOCK.lock().unwrap();
        let temp = tempdir().expect("tempdir");
        let _guard = DirGuard::change_to(temp.path());
        let config = Config::defaults();

        let err = check_session_exists(&config).unwrap_err();
        match err {
            Error::SessionNotFound(path) => assert!(path.ends_with(".session")),
            other => panic!("Expected SessionNotFound, got {:?}", other),
        }

        File::create(config.session_file()).expect("create session file");
        check_session_exists(&config).expect("session should exist");
    }

    #[tokio::test]
    async fn get_client_requires_credentials_first() {
        let config = Config::defaults();
        let result = get_client(&config).await;
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
