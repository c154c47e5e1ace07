//! Command implementations
//!
//! Each module backs one subcommand of the `telegram_relay` CLI and one
//! standalone binary in `src/bin`.

pub mod download;
pub mod forward;
pub mod init_session;
pub mod menu;
pub mod upload;

pub use download::DownloadArgs;
pub use forward::{ForwardArgs, ForwardCli, InviteCli};
pub use upload::UploadArgs;
