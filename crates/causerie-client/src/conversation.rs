//! Single-conversation synchronization.
//!
//! Two independent subscriptions feed one task: the chat metadata (existence
//! and authorization) and the message sequence (ordered history). The
//! derived view is published through a watch channel; when the viewer loses
//! access or the chat disappears, the view carries a leave signal and the
//! task stops, releasing both subscriptions together.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::warn;

use causerie_shared::constants::{CHATS_PATH, MESSAGES_PATH};
use causerie_shared::{Chat, ChatId, ChatKind, Message, MessageId};

use causerie_backend::{RealtimeStore, Snapshot};

use crate::context::ClientContext;

/// Why the viewer must navigate away from the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveReason {
    /// The chat record does not exist (or was removed).
    NotFound,
    /// The chat is not public and the viewer is not a participant.
    AccessDenied,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConversationView {
    pub chat: Option<Chat>,
    /// Message history, ascending by timestamp (ties keep store key order).
    pub messages: Vec<Message>,
    /// True until the first message snapshot arrives, even an empty one.
    pub loading: bool,
    /// Set when the viewer should be redirected away.
    pub leave: Option<LeaveReason>,
}

impl Default for ConversationView {
    fn default() -> Self {
        Self {
            chat: None,
            messages: Vec::new(),
            loading: true,
            leave: None,
        }
    }
}

/// Handle to a running conversation sync. Dropping it (or switching to
/// another conversation by opening a new one) cancels both subscriptions.
pub struct ConversationSync {
    chat_id: ChatId,
    view: watch::Receiver<ConversationView>,
    task: JoinHandle<()>,
}

impl ConversationSync {
    pub fn open(ctx: Arc<ClientContext>, chat_id: ChatId) -> Self {
        let (tx, rx) = watch::channel(ConversationView::default());
        let task = tokio::spawn(run(ctx, chat_id.clone(), tx));
        Self {
            chat_id,
            view: rx,
            task,
        }
    }

    pub fn chat_id(&self) -> &ChatId {
        &self.chat_id
    }

    pub fn watch(&self) -> watch::Receiver<ConversationView> {
        self.view.clone()
    }

    pub fn view(&self) -> ConversationView {
        self.view.borrow().clone()
    }
}

impl Drop for ConversationSync {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run(ctx: Arc<ClientContext>, chat_id: ChatId, tx: watch::Sender<ConversationView>) {
    let mut meta_sub = ctx.store.subscribe(&format!("{CHATS_PATH}/{chat_id}"));
    let mut msg_sub = ctx.store.subscribe(&format!("{MESSAGES_PATH}/{chat_id}"));
    let mut view = ConversationView::default();

    loop {
        tokio::select! {
            snapshot = meta_sub.next() => {
                let snapshot = match snapshot {
                    Some(snapshot) => snapshot,
                    None => break,
                };
                match snapshot {
                    None => {
                        warn!(chat = %chat_id, "chat record missing, leaving");
                        view.chat = None;
                        view.leave = Some(LeaveReason::NotFound);
                        let _ = tx.send(view.clone());
                        break;
                    }
                    Some(value) => {
                        let chat: Chat = match serde_json::from_value(value) {
                            Ok(chat) => chat,
                            Err(err) => {
                                warn!(chat = %chat_id, error = %err, "malformed chat record");
                                continue;
                            }
                        };
                        // Re-checked on every metadata update: a viewer
                        // removed from the participant map mid-session is
                        // evicted on the next snapshot.
                        if !authorized(&ctx, &chat) {
                            warn!(chat = %chat_id, "viewer is not a participant, leaving");
                            view.chat = None;
                            view.leave = Some(LeaveReason::AccessDenied);
                            let _ = tx.send(view.clone());
                            break;
                        }
                        view.chat = Some(chat);
                        let _ = tx.send(view.clone());
                    }
                }
            }
            snapshot = msg_sub.next() => {
                let snapshot = match snapshot {
                    Some(snapshot) => snapshot,
                    None => break,
                };
                // The first message snapshot completes loading, even when
                // the conversation has no messages yet.
                view.loading = false;
                view.messages = flatten_messages(snapshot);
                let _ = tx.send(view.clone());
            }
        }
    }
}

fn authorized(ctx: &ClientContext, chat: &Chat) -> bool {
    if chat.kind == ChatKind::Public {
        return true;
    }
    match ctx.identity() {
        Some(user) => chat.is_member(&user.id),
        None => false,
    }
}

/// Flatten a keyed message snapshot into an ordered history. The store key
/// is authoritative for the id; keys are monotonic, so equal timestamps
/// keep their insertion order.
fn flatten_messages(snapshot: Snapshot) -> Vec<Message> {
    let map = match snapshot {
        Some(Value::Object(map)) => map,
        _ => return Vec::new(),
    };

    let mut keyed: Vec<(String, Message)> = Vec::with_capacity(map.len());
    for (key, value) in map {
        match serde_json::from_value::<Message>(value) {
            Ok(mut message) => {
                message.id = MessageId::new(key.clone());
                keyed.push((key, message));
            }
            Err(err) => {
                warn!(key = %key, error = %err, "skipping malformed message record");
            }
        }
    }

    keyed.sort_by(|(ka, a), (kb, b)| a.timestamp.cmp(&b.timestamp).then_with(|| ka.cmp(kb)));
    keyed.into_iter().map(|(_, message)| message).collect()
}
