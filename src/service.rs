//! The remote operations the forwarder needs, and their grammers implementation.

use grammers_client::types::peer::Peer;
use grammers_client::types::Message;
use grammers_client::Client;
use grammers_tl_types as tl;
use tracing::debug;

use crate::chat::{invite_hash, peer_name, resolve_by_id, tl_chat_id, ChatRef};
use crate::error::{Error, Result};

/// Result of trying to join a chat through an invite link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome<C> {
    Joined(C),
    AlreadyMember,
    /// The chat requires admin approval and a request is already queued.
    RequestPending,
}

/// Chat operations used by the range forwarder.
#[allow(async_fn_in_trait)]
pub trait ChatService {
    /// Resolved chat handle.
    type Chat: Clone;
    type Message;

    async fn resolve(&self, chat: &ChatRef) -> Result<Self::Chat>;

    /// `Ok(None)` when the id was deleted or never existed.
    async fn get_message(&self, chat: &Self::Chat, id: i32) -> Result<Option<Self::Message>>;

    /// Forward one message, keeping the "forwarded from" header.
    async fn forward(&self, from: &Self::Chat, to: &Self::Chat, id: i32) -> Result<()>;

    /// Forward many ids in one request. Returns how many messages the
    /// server reported back; deleted ids are dropped silently.
    async fn forward_batch(&self, from: &Self::Chat, to: &Self::Chat, ids: &[i32])
        -> Result<usize>;

    async fn join_via_invite(&self, link: &str) -> Result<JoinOutcome<Self::Chat>>;

    /// Look up a chat we are already a member of from its invite link.
    async fn resolve_invite(&self, link: &str) -> Result<Self::Chat>;

    fn chat_title(&self, chat: &Self::Chat) -> String;
}

/// Chat ids carried by an updates object (e.g. the result of joining).
fn chats_in_updates(updates: &tl::enums::Updates) -> Vec<i64> {
    match updates {
        tl::enums::Updates::Updates(u) => u.chats.iter().map(tl_chat_id).collect(),
        tl::enums::Updates::Combined(u) => u.chats.iter().map(tl_chat_id).collect(),
        _ => Vec::new(),
    }
}

/// Join outcome for an `ImportChatInvite` error that still leaves us with a
/// usable chat. `is_rpc` checks the error against an RPC error name.
fn join_outcome_for<C>(is_rpc: impl Fn(&str) -> bool) -> Option<JoinOutcome<C>> {
    if is_rpc("USER_ALREADY_PARTICIPANT") {
        Some(JoinOutcome::AlreadyMember)
    } else if is_rpc("INVITE_REQUEST_SENT") {
        Some(JoinOutcome::RequestPending)
    } else {
        None
    }
}

fn required_hash(link: &str) -> Result<&str> {
    invite_hash(link)
        .ok_or_else(|| Error::InvalidArgument(format!("'{}' is not an invite link", link)))
}

impl ChatService for Client {
    type Chat = Peer;
    type Message = Message;

    async fn resolve(&self, chat: &ChatRef) -> Result<Peer> {
        match chat {
            ChatRef::Id(id) => resolve_by_id(self, *id).await,
            ChatRef::Invite(link) => self.resolve_invite(link).await,
        }
    }

    async fn get_message(&self, chat: &Peer, id: i32) -> Result<Option<Message>> {
        let mut found = self.get_messages_by_id(chat, &[id]).await?;
        Ok(found.pop().flatten())
    }

    async fn forward(&self, from: &Peer, to: &Peer, id: i32) -> Result<()> {
        self.forward_messages(to, &[id], from).await?;
        Ok(())
    }

    async fn forward_batch(&self, from: &Peer, to: &Peer, ids: &[i32]) -> Result<usize> {
        let forwarded = self.forward_messages(to, ids, from).await?;
        Ok(forwarded.iter().filter(|m| m.is_some()).count())
    }

    async fn join_via_invite(&self, link: &str) -> Result<JoinOutcome<Peer>> {
        let request = tl::functions::messages::ImportChatInvite {
            hash: required_hash(link)?.to_string(),
        };

        match self.invoke(&request).await {
            Ok(updates) => {
                let chat_id = chats_in_updates(&updates).into_iter().next().ok_or_else(|| {
                    Error::ChatNotFound(format!("joining {} returned no chat", link))
                })?;
                debug!(chat_id, "Joined chat via invite link");
                Ok(JoinOutcome::Joined(resolve_by_id(self, chat_id).await?))
            }
            Err(e) => join_outcome_for(|name| e.is(name))
                .ok_or_else(|| Error::ChatNotFound(format!("cannot join {}: {}", link, e))),
        }
    }

    async fn resolve_invite(&self, link: &str) -> Result<Peer> {
        let hash = required_hash(link)?;
        let invite = self
            .invoke(&tl::functions::messages::CheckChatInvite {
                hash: hash.to_string(),
            })
            .await
            .map_err(|e| Error::ChatNotFound(format!("cannot check {}: {}", link, e)))?;

        let chat = match invite {
            tl::enums::ChatInvite::Already(already) => already.chat,
            tl::enums::ChatInvite::Peek(peek) => peek.chat,
            tl::enums::ChatInvite::Invite(_) => {
                return Err(Error::ChatNotFound(format!(
                    "not a member of {} yet",
                    link
                )))
            }
        };

        resolve_by_id(self, tl_chat_id(&chat)).await
    }

    fn chat_title(&self, chat: &Peer) -> String {
        peer_name(chat)
    }
}
