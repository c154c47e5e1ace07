//! Range forwarding against an in-memory channel.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::time::Duration;

use telegram_relay::{
    error::{Error, Result},
    ChatRef, ChatService, ForwardRequest, Forwarder, JoinOutcome,
};

const SOURCE: i64 = 2732989224;
const DEST: i64 = 3305131927;
const INVITE: &str = "https://t.me/+YEZw2KYgHf9lNGJl";

/// Source channel with a fixed set of posts and a destination inbox.
struct Channel {
    posts: BTreeMap<i32, &'static str>,
    protected: Vec<i32>,
    member: bool,
    flood_wait: bool,
    inbox: RefCell<Vec<(i32, &'static str)>>,
}

impl Channel {
    fn new(posts: &[(i32, &'static str)]) -> Self {
        Self {
            posts: posts.iter().copied().collect(),
            protected: Vec::new(),
            member: false,
            flood_wait: false,
            inbox: RefCell::new(Vec::new()),
        }
    }
}

impl ChatService for Channel {
    type Chat = i64;
    type Message = &'static str;

    async fn resolve(&self, chat: &ChatRef) -> Result<i64> {
        match chat.bare_id() {
            Some(id) if id == SOURCE || id == DEST => Ok(id),
            _ => Err(Error::ChatNotFound(chat.to_string())),
        }
    }

    async fn get_message(&self, _chat: &i64, id: i32) -> Result<Option<&'static str>> {
        Ok(self.posts.get(&id).copied())
    }

    async fn forward(&self, _from: &i64, to: &i64, id: i32) -> Result<()> {
        assert_eq!(*to, DEST);
        if self.protected.contains(&id) {
            return Err(Error::ForwardProtected);
        }
        let text = self.posts[&id];
        self.inbox.borrow_mut().push((id, text));
        Ok(())
    }

    async fn forward_batch(&self, _from: &i64, _to: &i64, ids: &[i32]) -> Result<usize> {
        if self.flood_wait {
            return Err(Error::TelegramError("FLOOD_WAIT_30".into()));
        }
        let mut inbox = self.inbox.borrow_mut();
        for id in ids {
            if let Some(text) = self.posts.get(id) {
                inbox.push((*id, *text));
            }
        }
        Ok(inbox.len())
    }

    async fn join_via_invite(&self, _link: &str) -> Result<JoinOutcome<i64>> {
        if self.member {
            Ok(JoinOutcome::AlreadyMember)
        } else {
            Ok(JoinOutcome::Joined(DEST))
        }
    }

    async fn resolve_invite(&self, _link: &str) -> Result<i64> {
        Ok(DEST)
    }

    fn chat_title(&self, chat: &i64) -> String {
        format!("chat {}", chat)
    }
}

fn request(dest: ChatRef, start_id: i32, end_id: i32) -> ForwardRequest {
    ForwardRequest {
        source: ChatRef::Id(SOURCE),
        dest,
        start_id,
        end_id,
    }
}

#[tokio::test]
async fn test_forward_keeps_order_and_skips_gaps() {
    let channel = Channel::new(&[(2, "intro"), (3, "part 1"), (5, "part 2")]);
    let forwarder = Forwarder::new(&channel, Duration::ZERO);

    let summary = forwarder
        .run(&request(ChatRef::Id(-1003305131927), 2, 6))
        .await
        .unwrap();

    assert_eq!((summary.forwarded, summary.skipped, summary.failed), (3, 2, 0));
    assert_eq!(
        *channel.inbox.borrow(),
        vec![(2, "intro"), (3, "part 1"), (5, "part 2")]
    );
}

#[tokio::test]
async fn test_protected_messages_are_counted_as_failed() {
    let mut channel = Channel::new(&[(1, "a"), (2, "b")]);
    channel.protected = vec![2];
    let forwarder = Forwarder::new(&channel, Duration::ZERO);

    let summary = forwarder
        .run(&request(ChatRef::Id(DEST), 1, 2))
        .await
        .unwrap();

    assert_eq!((summary.forwarded, summary.skipped, summary.failed), (1, 0, 1));
    assert_eq!(summary.total(), 2);
}

#[tokio::test]
async fn test_invite_destination_when_already_member() {
    let mut channel = Channel::new(&[(7, "only")]);
    channel.member = true;
    let forwarder = Forwarder::new(&channel, Duration::ZERO);

    let summary = forwarder
        .run(&request(ChatRef::Invite(INVITE.into()), 7, 7))
        .await
        .unwrap();

    assert_eq!(summary.forwarded, 1);
    assert_eq!(*channel.inbox.borrow(), vec![(7, "only")]);
}

#[tokio::test]
async fn test_unknown_source_aborts_before_forwarding() {
    let channel = Channel::new(&[(1, "a")]);
    let forwarder = Forwarder::new(&channel, Duration::ZERO);

    let bad = ForwardRequest {
        source: ChatRef::Id(42),
        ..request(ChatRef::Id(DEST), 1, 1)
    };
    let err = forwarder.run(&bad).await.unwrap_err();

    assert!(matches!(err, Error::ChatNotFound(_)));
    assert!(channel.inbox.borrow().is_empty());
}

#[tokio::test]
async fn test_bulk_reports_returned_count() {
    let channel = Channel::new(&[(10, "a"), (12, "c")]);
    let forwarder = Forwarder::new(&channel, Duration::ZERO);

    let outcome = forwarder
        .run_bulk(&request(ChatRef::Id(DEST), 10, 12))
        .await
        .unwrap();

    assert_eq!(outcome.requested, 3);
    assert_eq!(outcome.returned, 2);
}

#[tokio::test]
async fn test_bulk_failure_is_reported_in_outcome() {
    let mut channel = Channel::new(&[(10, "a"), (11, "b")]);
    channel.flood_wait = true;
    let forwarder = Forwarder::new(&channel, Duration::ZERO);

    let outcome = forwarder
        .run_bulk(&request(ChatRef::Id(DEST), 10, 11))
        .await
        .unwrap();

    assert_eq!(outcome.requested, 2);
    assert_eq!(outcome.returned, 0);
    assert!(outcome.failed.unwrap().contains("FLOOD_WAIT_30"));
    assert!(channel.inbox.borrow().is_empty());
}
