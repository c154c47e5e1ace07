//! Telegram relay library
//!
//! Tools to:
//! - Forward ranges of messages between chats, including into chats reached
//!   through an invite link
//! - Upload videos as streaming media with progress reporting
//! - Drive the external `tdl` downloader for links, threads and id ranges

pub mod chat;
pub mod config;
pub mod error;
pub mod forward;
pub mod links;
pub mod metrics;
pub mod progress;
pub mod service;
pub mod session;
pub mod tdl;

// Re-export common types
pub use chat::ChatRef;
pub use config::Config;
pub use error::{Error, Result};
pub use forward::{ForwardOutcome, ForwardRequest, ForwardSummary, Forwarder};
pub use service::{ChatService, JoinOutcome};
pub use session::{check_session_exists, get_client, SessionLock};

pub mod commands;
