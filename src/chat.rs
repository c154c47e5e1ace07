//! Chat references and entity resolution

use std::fmt;
use std::str::FromStr;

use grammers_client::types::peer::Peer;
use grammers_client::Client;
use grammers_tl_types as tl;

use crate::error::{Error, Result};

/// Offset Telegram adds to channel ids in the "marked" `-100…` form.
const CHANNEL_MARK: i64 = 1_000_000_000_000;

/// A chat as given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatRef {
    /// Numeric id in bare (`2732989224`), group (`-12345`) or marked
    /// channel (`-1002732989224`) form.
    Id(i64),
    /// Invite link or bare `+HASH` token.
    Invite(String),
}

impl ChatRef {
    /// Id without the group sign or the channel mark. `None` for invite
    /// links and for ids that have no bare form.
    pub fn bare_id(&self) -> Option<i64> {
        match self {
            ChatRef::Id(id) => bare_chat_id(*id).ok(),
            ChatRef::Invite(_) => None,
        }
    }
}

impl FromStr for ChatRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Ok(id) = s.parse::<i64>() {
            return Ok(ChatRef::Id(id));
        }
        if invite_hash(s).is_some() {
            return Ok(ChatRef::Invite(s.to_string()));
        }
        Err(Error::InvalidArgument(format!(
            "'{}' is neither a chat id nor an invite link",
            s
        )))
    }
}

impl fmt::Display for ChatRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatRef::Id(id) => write!(f, "{}", id),
            ChatRef::Invite(link) => write!(f, "{}", link),
        }
    }
}

/// Strip the sign and the `-100` channel mark from a chat id.
pub fn bare_chat_id(id: i64) -> Result<i64> {
    let positive = id
        .checked_neg()
        .ok_or_else(|| Error::InvalidArgument(format!("{} is not a valid chat id", id)))?;
    if id <= -CHANNEL_MARK {
        Ok(positive - CHANNEL_MARK)
    } else {
        Ok(id.abs())
    }
}

/// Extract the invite hash from `https://t.me/+HASH`, `t.me/joinchat/HASH`
/// or `+HASH`.
pub fn invite_hash(link: &str) -> Option<&str> {
    let link = link.trim().trim_end_matches('/');
    let last = link.rsplit('/').next()?;
    let is_invite_path = link.contains("/joinchat/") || last.starts_with('+');
    if !is_invite_path {
        return None;
    }
    let hash = last.trim_start_matches('+');
    let valid = !hash.is_empty()
        && hash
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    valid.then_some(hash)
}

/// Get the bare ID of a Peer
pub fn peer_id(peer: &Peer) -> i64 {
    match peer {
        Peer::User(u) => u.raw.id(),
        Peer::Group(g) => tl_chat_id(&g.raw),
        Peer::Channel(c) => c.raw.id,
    }
}

/// Bare id of a raw chat object
pub fn tl_chat_id(chat: &tl::enums::Chat) -> i64 {
    match chat {
        tl::enums::Chat::Empty(c) => c.id,
        tl::enums::Chat::Chat(c) => c.id,
        tl::enums::Chat::Forbidden(c) => c.id,
        tl::enums::Chat::Channel(c) => c.id,
        tl::enums::Chat::ChannelForbidden(c) => c.id,
    }
}

/// Get the display name for a peer
pub fn peer_name(peer: &Peer) -> String {
    peer.name()
        .map(|s| s.to_string())
        .unwrap_or_else(|| "Unknown".to_string())
}

/// Find a chat in the user's dialogs by id (any of the accepted id forms).
pub async fn resolve_by_id(client: &Client, id: i64) -> Result<Peer> {
    let target = bare_chat_id(id)?;
    let mut dialogs = client.iter_dialogs();

    while let Some(dialog) = dialogs
        .next()
        .await
        .map_err(|e| Error::TelegramError(e.to_string()))?
    {
        if peer_id(&dialog.peer) == target {
            return Ok(dialog.peer.clone());
        }
    }

    Err(Error::ChatNotFound(format!("{} not found in dialogs", id)))
}

/// Find chat by numeric id or username (with or without @)
pub async fn find_chat(client: &Client, name: &str) -> Result<Peer> {
    if let Ok(id) = name.trim().parse::<i64>() {
        return resolve_by_id(client, id).await;
    }

    let username = name.trim().trim_start_matches('@');
    client
        .resolve_username(username)
        .await
        .map_err(|e| Error::TelegramError(e.to_string()))?
        .ok_or_else(|| Error::ChatNotFound(format!("Username @{} not found", username)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_chat_id_strips_channel_mark() {
        assert_eq!(bare_chat_id(-1003159701355).unwrap(), 3159701355);
        assert_eq!(bare_chat_id(-1002732989224).unwrap(), 2732989224);
    }

    #[test]
    fn bare_chat_id_handles_group_and_bare_forms() {
        assert_eq!(bare_chat_id(-4567).unwrap(), 4567);
        assert_eq!(bare_chat_id(2732989224).unwrap(), 2732989224);
        assert_eq!(bare_chat_id(0).unwrap(), 0);
    }

    #[test]
    fn bare_chat_id_rejects_min_value() {
        assert!(matches!(
            bare_chat_id(i64::MIN),
            Err(Error::InvalidArgument(_))
        ));
        assert_eq!(bare_chat_id(i64::MAX).unwrap(), i64::MAX);
        assert_eq!(ChatRef::Id(i64::MIN).bare_id(), None);
    }

    #[test]
    fn marked_and_bare_ids_compare_equal() {
        let marked = ChatRef::Id(-1003305131927);
        let bare = ChatRef::Id(3305131927);
        assert_eq!(marked.bare_id(), bare.bare_id());
    }

    #[test]
    fn invite_hash_from_plus_link() {
        assert_eq!(
            invite_hash("https://t.me/+YEZw2KYgHf9lNGJl"),
            Some("YEZw2KYgHf9lNGJl")
        );
        assert_eq!(invite_hash("t.me/+abc_-1/"), Some("abc_-1"));
        assert_eq!(invite_hash("+abc"), Some("abc"));
    }

    #[test]
    fn invite_hash_from_joinchat_link() {
        assert_eq!(
            invite_hash("https://t.me/joinchat/AAAAAEHbEkejzxUjAUCzYA"),
            Some("AAAAAEHbEkejzxUjAUCzYA")
        );
    }

    #[test]
    fn invite_hash_rejects_other_links() {
        assert_eq!(invite_hash("https://t.me/durov"), None);
        assert_eq!(invite_hash("https://t.me/c/123/45"), None);
        assert_eq!(invite_hash("+"), None);
        assert_eq!(invite_hash(""), None);
    }

    #[test]
    fn chat_ref_parses_ids_and_invites() {
        assert_eq!("-1003159701355".parse::<ChatRef>().unwrap(), ChatRef::Id(-1003159701355));
        assert_eq!(" 42 ".parse::<ChatRef>().unwrap(), ChatRef::Id(42));
        assert_eq!(
            "https://t.me/+YEZw2KYgHf9lNGJl".parse::<ChatRef>().unwrap(),
            ChatRef::Invite("https://t.me/+YEZw2KYgHf9lNGJl".to_string())
        );
    }

    #[test]
    fn chat_ref_rejects_garbage() {
        let err = "not-a-chat".parse::<ChatRef>().unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn chat_ref_display_round_trips_input() {
        assert_eq!(ChatRef::Id(-100123).to_string(), "-100123");
        assert_eq!(ChatRef::Invite("+abc".into()).to_string(), "+abc");
        assert_eq!(ChatRef::Invite("+abc".into()).bare_id(), None);
    }
}
