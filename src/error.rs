//! Error types for the Telegram relay

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Session file not found: {0}")]
    SessionNotFound(String),

    #[error("Session is locked by another process")]
    SessionLocked,

    #[error("Failed to acquire session lock: {0}")]
    LockError(String),

    #[error("Chat not found: {0}")]
    ChatNotFound(String),

    #[error("Message {0} not found")]
    MessageNotFound(i32),

    #[error("Source chat has forwarding protection")]
    ForwardProtected,

    #[error("Telegram API error: {0}")]
    TelegramError(String),

    #[error("Downloader error: {0}")]
    Downloader(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl Error {
    /// Setup-time errors abort a command before any per-message work.
    /// Everything else is scoped to a single message and gets counted.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Error::MessageNotFound(_) | Error::ForwardProtected | Error::TelegramError(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<grammers_client::InvocationError> for Error {
    fn from(err: grammers_client::InvocationError) -> Self {
        if err.is("CHAT_FORWARDS_RESTRICTED") {
            return Error::ForwardProtected;
        }
        Error::TelegramError(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(err.to_string())
    }
}
