//! In-memory store of pending sessions, keyed by sender, with expiry.
//!
//! One store per workflow kind: the store is the namespace, so unrelated
//! workflows for the same sender never collide. At most one live session per
//! sender exists in a store; creating a second one replaces the first and
//! cancels its timer.

use std::{collections::HashMap, sync::Arc, time::Duration};

use {
    tokio::{sync::Mutex, task::JoinHandle},
    tracing::debug,
};

use snagbot_common::types::InboundMessage;

use crate::{correlate::CorrelationRule, error::SelectionError, select};

/// State carried by a pending session. One implementor per workflow kind,
/// typically an enum with one variant per stage.
///
/// The option set is fixed when the session is created; only the stage data
/// advances between sessions, never within one.
pub trait SessionState: Send + 'static {
    /// Number of options currently offered. Replies are validated against
    /// `1..=option_count()`.
    fn option_count(&self) -> usize;
}

/// A pending prompt waiting for the sender's next pick.
pub struct Session<S> {
    /// Conversation to reply into.
    pub chat: String,
    /// Which inbound messages may resolve this session.
    pub rule: CorrelationRule,
    /// Workflow-specific stage data, including the option payloads.
    pub state: S,
}

impl<S> Session<S> {
    pub fn new(chat: impl Into<String>, rule: CorrelationRule, state: S) -> Self {
        Self {
            chat: chat.into(),
            rule,
            state,
        }
    }
}

/// Outcome of offering an inbound message to a store.
pub enum Resolution<S> {
    /// No session for this sender, or the correlation rule does not match.
    /// The message is not consumed and falls through to command dispatch.
    NotMine,
    /// The reply did not parse as a valid option. The session stays live.
    Rejected { chat: String, error: SelectionError },
    /// A valid pick. The session has already been removed from the store
    /// and its timer cancelled; `choice` is the zero-based option index.
    Picked { choice: usize, session: Session<S> },
}

/// A session that timed out, handed to the expiry callback.
pub struct Expired<S> {
    pub sender: String,
    pub session: Session<S>,
}

/// Callback invoked when a session expires. Runs on the timer task, outside
/// the store lock.
pub type ExpiryFn<S> = Arc<dyn Fn(Expired<S>) + Send + Sync>;

struct Slot<S> {
    session: Session<S>,
    epoch: u64,
    timer: JoinHandle<()>,
}

struct Inner<S> {
    slots: HashMap<String, Slot<S>>,
    next_epoch: u64,
}

/// In-memory session store for one workflow kind.
pub struct SessionStore<S> {
    namespace: &'static str,
    timeout: Duration,
    inner: Arc<Mutex<Inner<S>>>,
    on_expiry: Option<ExpiryFn<S>>,
}

impl<S: SessionState> SessionStore<S> {
    pub fn new(namespace: &'static str, timeout: Duration) -> Self {
        Self {
            namespace,
            timeout,
            inner: Arc::new(Mutex::new(Inner {
                slots: HashMap::new(),
                next_epoch: 0,
            })),
            on_expiry: None,
        }
    }

    /// Register a callback to run when a session times out.
    #[must_use]
    pub fn with_expiry_notice(mut self, on_expiry: ExpiryFn<S>) -> Self {
        self.on_expiry = Some(on_expiry);
        self
    }

    /// Insert a session for `sender`, replacing and cancelling any prior one.
    pub async fn create(&self, sender: &str, session: Session<S>) {
        let mut inner = self.inner.lock().await;
        let epoch = inner.next_epoch;
        inner.next_epoch += 1;
        let timer = self.spawn_timer(sender.to_string(), epoch);
        let old = inner.slots.insert(
            sender.to_string(),
            Slot {
                session,
                epoch,
                timer,
            },
        );
        drop(inner);
        if let Some(old) = old {
            old.timer.abort();
            debug!(namespace = self.namespace, sender, "superseded pending session");
        } else {
            debug!(namespace = self.namespace, sender, "created pending session");
        }
    }

    /// Read access to the current session for `sender`, if any.
    pub async fn peek<R>(&self, sender: &str, f: impl FnOnce(&Session<S>) -> R) -> Option<R> {
        let inner = self.inner.lock().await;
        inner.slots.get(sender).map(|slot| f(&slot.session))
    }

    /// Remove the session for `sender` and cancel its timer.
    ///
    /// Idempotent: removing an absent key returns `None`.
    pub async fn remove(&self, sender: &str) -> Option<Session<S>> {
        let slot = self.inner.lock().await.slots.remove(sender)?;
        slot.timer.abort();
        Some(slot.session)
    }

    /// Drop every session and cancel every timer.
    pub async fn clear(&self) {
        let slots = std::mem::take(&mut self.inner.lock().await.slots);
        for slot in slots.into_values() {
            slot.timer.abort();
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.slots.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.slots.is_empty()
    }

    /// Offer an inbound message to this store.
    ///
    /// Looks up the sender's session, applies its correlation rule, then
    /// validates the text as a pick. On a valid pick the session is removed
    /// and its timer cancelled before this returns, so the caller's follow-up
    /// (successor session or terminal action) can never race a stale state.
    pub async fn resolve(&self, msg: &InboundMessage) -> Resolution<S> {
        let mut inner = self.inner.lock().await;
        let Some(slot) = inner.slots.get(&msg.sender) else {
            return Resolution::NotMine;
        };
        if !slot.session.rule.matches(msg) {
            debug!(
                namespace = self.namespace,
                sender = %msg.sender,
                "message does not correlate, ignoring"
            );
            return Resolution::NotMine;
        }
        match select::parse_choice(&msg.text, slot.session.state.option_count()) {
            Err(error) => {
                debug!(
                    namespace = self.namespace,
                    sender = %msg.sender,
                    %error,
                    "invalid choice, session kept"
                );
                Resolution::Rejected {
                    chat: slot.session.chat.clone(),
                    error,
                }
            },
            Ok(choice) => {
                let Some(slot) = inner.slots.remove(&msg.sender) else {
                    return Resolution::NotMine;
                };
                drop(inner);
                slot.timer.abort();
                debug!(
                    namespace = self.namespace,
                    sender = %msg.sender,
                    choice,
                    "selection resolved"
                );
                Resolution::Picked {
                    choice,
                    session: slot.session,
                }
            },
        }
    }

    fn spawn_timer(&self, sender: String, epoch: u64) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        let on_expiry = self.on_expiry.clone();
        let namespace = self.namespace;
        let timeout = self.timeout;
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            // The slot may have been resolved or superseded while this timer
            // slept; only a slot with a matching epoch is ours to remove.
            let expired = {
                let mut inner = inner.lock().await;
                if inner.slots.get(&sender).is_some_and(|slot| slot.epoch == epoch) {
                    inner.slots.remove(&sender)
                } else {
                    None
                }
            };
            if let Some(slot) = expired {
                debug!(namespace, sender = %sender, "session expired");
                if let Some(on_expiry) = on_expiry {
                    on_expiry(Expired {
                        sender,
                        session: slot.session,
                    });
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Mutex as StdMutex,
        atomic::{AtomicUsize, Ordering},
    };

    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(150);

    struct Menu {
        options: Vec<&'static str>,
    }

    impl SessionState for Menu {
        fn option_count(&self) -> usize {
            self.options.len()
        }
    }

    fn videos() -> Menu {
        Menu {
            options: vec!["CatVideo", "DogVideo", "BirdVideo"],
        }
    }

    fn msg(sender: &str, text: &str) -> InboundMessage {
        InboundMessage {
            chat: "chat-1".into(),
            sender: sender.into(),
            text: text.into(),
            id: "in-1".into(),
            quoted_id: None,
        }
    }

    fn quoting(sender: &str, text: &str, quoted: &str) -> InboundMessage {
        InboundMessage {
            quoted_id: Some(quoted.into()),
            ..msg(sender, text)
        }
    }

    #[tokio::test]
    async fn resolve_without_session_is_not_mine() {
        let store: SessionStore<Menu> = SessionStore::new("test", TIMEOUT);
        assert!(matches!(
            store.resolve(&msg("alice", "1")).await,
            Resolution::NotMine
        ));
    }

    #[tokio::test]
    async fn other_senders_do_not_touch_a_session() {
        let store = SessionStore::new("test", TIMEOUT);
        store
            .create("alice", Session::new("chat-1", CorrelationRule::AnyReply, videos()))
            .await;

        assert!(matches!(
            store.resolve(&msg("bob", "2")).await,
            Resolution::NotMine
        ));
        assert_eq!(store.len().await, 1);
        let count = store.peek("alice", |s| s.state.option_count()).await;
        assert_eq!(count, Some(3));
    }

    #[tokio::test]
    async fn valid_pick_removes_the_session() {
        let store = SessionStore::new("test", TIMEOUT);
        store
            .create("alice", Session::new("chat-1", CorrelationRule::AnyReply, videos()))
            .await;

        match store.resolve(&msg("alice", "2")).await {
            Resolution::Picked { choice, session } => {
                assert_eq!(choice, 1);
                assert_eq!(session.state.options[choice], "DogVideo");
                assert_eq!(session.chat, "chat-1");
            },
            _ => panic!("expected a pick"),
        }
        assert!(store.is_empty().await);
        // A second reply behaves as "no session".
        assert!(matches!(
            store.resolve(&msg("alice", "2")).await,
            Resolution::NotMine
        ));
    }

    #[tokio::test]
    async fn pick_trims_whitespace() {
        let store = SessionStore::new("test", TIMEOUT);
        store
            .create("alice", Session::new("chat-1", CorrelationRule::AnyReply, videos()))
            .await;
        assert!(matches!(
            store.resolve(&msg("alice", "  2  ")).await,
            Resolution::Picked { choice: 1, .. }
        ));
    }

    #[tokio::test]
    async fn out_of_range_keeps_the_session() {
        let store = SessionStore::new("test", TIMEOUT);
        store
            .create("alice", Session::new("chat-1", CorrelationRule::AnyReply, videos()))
            .await;

        match store.resolve(&msg("alice", "5")).await {
            Resolution::Rejected { chat, error } => {
                assert_eq!(chat, "chat-1");
                assert_eq!(error, SelectionError::OutOfRange { got: 5, max: 3 });
            },
            _ => panic!("expected a rejection"),
        }
        assert_eq!(store.len().await, 1);
        let options = store.peek("alice", |s| s.state.options.clone()).await;
        assert_eq!(options, Some(vec!["CatVideo", "DogVideo", "BirdVideo"]));
    }

    #[tokio::test]
    async fn non_numeric_keeps_the_session() {
        let store = SessionStore::new("test", TIMEOUT);
        store
            .create("alice", Session::new("chat-1", CorrelationRule::AnyReply, videos()))
            .await;

        match store.resolve(&msg("alice", "two")).await {
            Resolution::Rejected { error, .. } => {
                assert_eq!(error, SelectionError::NotANumber);
            },
            _ => panic!("expected a rejection"),
        }
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn empty_text_is_not_a_selection() {
        let store = SessionStore::new("test", TIMEOUT);
        store
            .create("alice", Session::new("chat-1", CorrelationRule::AnyReply, videos()))
            .await;
        assert!(matches!(
            store.resolve(&msg("alice", "   ")).await,
            Resolution::NotMine
        ));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn anchored_sessions_require_the_quote() {
        let store = SessionStore::new("test", TIMEOUT);
        store
            .create(
                "alice",
                Session::new("chat-1", CorrelationRule::QuoteOf("msg-a".into()), videos()),
            )
            .await;

        // Plain text: ignored, session persists.
        assert!(matches!(
            store.resolve(&msg("alice", "1")).await,
            Resolution::NotMine
        ));
        assert_eq!(store.len().await, 1);

        // Quoting some other message: still ignored.
        assert!(matches!(
            store.resolve(&quoting("alice", "1", "msg-b")).await,
            Resolution::NotMine
        ));
        assert_eq!(store.len().await, 1);

        // Quoting the anchor: resolves.
        assert!(matches!(
            store.resolve(&quoting("alice", "1", "msg-a")).await,
            Resolution::Picked { choice: 0, .. }
        ));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let store = SessionStore::new("test", TIMEOUT);
        store
            .create("alice", Session::new("chat-1", CorrelationRule::AnyReply, videos()))
            .await;

        assert!(store.remove("alice").await.is_some());
        assert!(store.remove("alice").await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_removes_the_session_and_notifies_once() {
        let notices = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&notices);
        let store = SessionStore::new("test", TIMEOUT).with_expiry_notice(Arc::new(
            move |expired: Expired<Menu>| {
                assert_eq!(expired.sender, "alice");
                seen.fetch_add(1, Ordering::SeqCst);
            },
        ));
        store
            .create("alice", Session::new("chat-1", CorrelationRule::AnyReply, videos()))
            .await;

        tokio::time::sleep(TIMEOUT + Duration::from_secs(1)).await;

        assert_eq!(notices.load(Ordering::SeqCst), 1);
        assert!(store.is_empty().await);

        // A pick arriving after expiry behaves as "no session".
        assert!(matches!(
            store.resolve(&msg("alice", "1")).await,
            Resolution::NotMine
        ));
        tokio::time::sleep(TIMEOUT).await;
        assert_eq!(notices.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn resolving_cancels_the_timer() {
        let notices = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&notices);
        let store = SessionStore::new("test", TIMEOUT)
            .with_expiry_notice(Arc::new(move |_: Expired<Menu>| {
                seen.fetch_add(1, Ordering::SeqCst);
            }));
        store
            .create("alice", Session::new("chat-1", CorrelationRule::AnyReply, videos()))
            .await;

        assert!(matches!(
            store.resolve(&msg("alice", "1")).await,
            Resolution::Picked { .. }
        ));

        tokio::time::sleep(TIMEOUT * 2).await;
        assert_eq!(notices.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn superseding_creation_cancels_the_first_timer() {
        let expired_options = Arc::new(StdMutex::new(Vec::new()));
        let seen = Arc::clone(&expired_options);
        let store = SessionStore::new("test", TIMEOUT).with_expiry_notice(Arc::new(
            move |expired: Expired<Menu>| {
                seen.lock().unwrap().push(expired.session.state.options.clone());
            },
        ));

        store
            .create(
                "alice",
                Session::new(
                    "chat-1",
                    CorrelationRule::AnyReply,
                    Menu {
                        options: vec!["first"],
                    },
                ),
            )
            .await;

        // Replace it partway through the first window.
        tokio::time::sleep(Duration::from_secs(100)).await;
        store
            .create(
                "alice",
                Session::new(
                    "chat-1",
                    CorrelationRule::AnyReply,
                    Menu {
                        options: vec!["second", "third"],
                    },
                ),
            )
            .await;

        // Past the first session's deadline: its timer must not fire.
        tokio::time::sleep(Duration::from_secs(100)).await;
        assert!(expired_options.lock().unwrap().is_empty());
        assert_eq!(store.len().await, 1);

        // Only the second session is resolvable.
        assert!(matches!(
            store.resolve(&msg("alice", "2")).await,
            Resolution::Picked { choice: 1, .. }
        ));

        tokio::time::sleep(TIMEOUT * 2).await;
        assert!(expired_options.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_session_expires_on_its_own_schedule() {
        let expired_options = Arc::new(StdMutex::new(Vec::new()));
        let seen = Arc::clone(&expired_options);
        let store = SessionStore::new("test", TIMEOUT).with_expiry_notice(Arc::new(
            move |expired: Expired<Menu>| {
                seen.lock().unwrap().push(expired.session.state.options.clone());
            },
        ));

        store
            .create(
                "alice",
                Session::new(
                    "chat-1",
                    CorrelationRule::AnyReply,
                    Menu {
                        options: vec!["first"],
                    },
                ),
            )
            .await;
        tokio::time::sleep(Duration::from_secs(100)).await;
        store
            .create(
                "alice",
                Session::new(
                    "chat-1",
                    CorrelationRule::AnyReply,
                    Menu {
                        options: vec!["second"],
                    },
                ),
            )
            .await;

        tokio::time::sleep(TIMEOUT + Duration::from_secs(1)).await;

        let expired = expired_options.lock().unwrap();
        assert_eq!(expired.as_slice(), &[vec!["second"]]);
        drop(expired);
        assert!(store.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn clear_cancels_all_timers() {
        let notices = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&notices);
        let store = SessionStore::new("test", TIMEOUT)
            .with_expiry_notice(Arc::new(move |_: Expired<Menu>| {
                seen.fetch_add(1, Ordering::SeqCst);
            }));

        store
            .create("alice", Session::new("chat-1", CorrelationRule::AnyReply, videos()))
            .await;
        store
            .create("bob", Session::new("chat-2", CorrelationRule::AnyReply, videos()))
            .await;
        assert_eq!(store.len().await, 2);

        store.clear().await;
        assert!(store.is_empty().await);

        tokio::time::sleep(TIMEOUT * 2).await;
        assert_eq!(notices.load(Ordering::SeqCst), 0);
    }
}
