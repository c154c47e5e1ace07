//! Telegram message links (`t.me/...`).
//!
//! Supported forms:
//! - `https://t.me/c/<chat>/<message>` (private chat)
//! - `https://t.me/c/<chat>/<thread>/<message>` (forum topic)
//! - `https://t.me/<username>/<message>` (public chat)

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};

static PRIVATE_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:https?://)?t\.me/c/(\d+)/(\d+)(?:/(\d+))?/?(?:\?.*)?$")
        .expect("valid private link regex")
});

static PUBLIC_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:https?://)?t\.me/([A-Za-z][A-Za-z0-9_]{3,})/(\d+)/?(?:\?.*)?$")
        .expect("valid public link regex")
});

static CHAT_IN_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"t\.me/c/(\d+)").expect("valid chat regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkChat {
    /// Bare numeric id of a private chat or channel.
    Private(i64),
    Public(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageLink {
    pub chat: LinkChat,
    pub thread: Option<i32>,
    pub message: i32,
}

impl FromStr for MessageLink {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let invalid = || Error::InvalidArgument(format!("'{}' is not a message link", s));

        if let Some(caps) = PRIVATE_LINK.captures(s) {
            let chat = caps[1].parse::<i64>().map_err(|_| invalid())?;
            let second = caps[2].parse::<i32>().map_err(|_| invalid())?;
            let (thread, message) = match caps.get(3) {
                Some(m) => (
                    Some(second),
                    m.as_str().parse::<i32>().map_err(|_| invalid())?,
                ),
                None => (None, second),
            };
            return Ok(MessageLink {
                chat: LinkChat::Private(chat),
                thread,
                message,
            });
        }

        if let Some(caps) = PUBLIC_LINK.captures(s) {
            return Ok(MessageLink {
                chat: LinkChat::Public(caps[1].to_string()),
                thread: None,
                message: caps[2].parse::<i32>().map_err(|_| invalid())?,
            });
        }

        Err(invalid())
    }
}

impl fmt::Display for MessageLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.chat {
            LinkChat::Private(id) => write!(f, "https://t.me/c/{}", id)?,
            LinkChat::Public(name) => write!(f, "https://t.me/{}", name)?,
        }
        if let Some(thread) = self.thread {
            write!(f, "/{}", thread)?;
        }
        write!(f, "/{}", self.message)
    }
}

/// Chat id from a `t.me/c/<id>/...` link, or the input unchanged.
pub fn extract_chat_id(input: &str) -> String {
    let input = input.trim();
    CHAT_IN_LINK
        .captures(input)
        .map(|caps| caps[1].to_string())
        .unwrap_or_else(|| input.to_string())
}

/// Message id from the last path segment of a link, or the input unchanged.
pub fn extract_message_id(input: &str) -> String {
    let input = input.trim();
    if input.chars().all(|c| c.is_ascii_digit()) {
        return input.to_string();
    }

    let last = input
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(input)
        .split('?')
        .next()
        .unwrap_or(input);
    if !last.is_empty() && last.chars().all(|c| c.is_ascii_digit()) {
        return last.to_string();
    }
    input.to_string()
}
