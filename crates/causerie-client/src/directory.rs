//! Visible chat list synchronization.
//!
//! A background task gated on the identity channel: while someone is signed
//! in it holds a subscription to the full chat set and recomputes the
//! visible, ordered list from every snapshot. The derived view is published
//! through a watch channel.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use causerie_backend::{RealtimeStore, Snapshot, Subscription};
use causerie_shared::constants::CHATS_PATH;
use causerie_shared::{Chat, ChatId, UserId};

use crate::context::ClientContext;

/// One row of the visible chat list.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectoryEntry {
    pub id: ChatId,
    pub chat: Chat,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DirectoryView {
    /// True until the first snapshot for the current identity arrives.
    pub loading: bool,
    pub entries: Vec<DirectoryEntry>,
}

impl Default for DirectoryView {
    fn default() -> Self {
        Self {
            loading: true,
            entries: Vec::new(),
        }
    }
}

/// Handle to the running directory sync. Dropping it tears the task down
/// and releases the store listener.
pub struct ChatDirectory {
    view: watch::Receiver<DirectoryView>,
    task: JoinHandle<()>,
}

impl ChatDirectory {
    pub fn open(ctx: Arc<ClientContext>) -> Self {
        let (tx, rx) = watch::channel(DirectoryView::default());
        let task = tokio::spawn(run(ctx, tx));
        Self { view: rx, task }
    }

    pub fn watch(&self) -> watch::Receiver<DirectoryView> {
        self.view.clone()
    }

    pub fn view(&self) -> DirectoryView {
        self.view.borrow().clone()
    }
}

impl Drop for ChatDirectory {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run(ctx: Arc<ClientContext>, tx: watch::Sender<DirectoryView>) {
    let mut identity_rx = ctx.identity_changes();
    let mut user: Option<UserId> = identity_rx
        .borrow_and_update()
        .as_ref()
        .map(|u| u.id.clone());
    let mut sub: Option<Subscription> = user.as_ref().map(|_| ctx.store.subscribe(CHATS_PATH));

    loop {
        tokio::select! {
            changed = identity_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let next = identity_rx.borrow_and_update().as_ref().map(|u| u.id.clone());
                if next == user {
                    continue;
                }
                user = next;
                match &user {
                    Some(_) => {
                        // Resubscribing delivers the current snapshot
                        // immediately, so the list repopulates on its own.
                        sub = Some(ctx.store.subscribe(CHATS_PATH));
                        debug!("directory subscription opened");
                    }
                    None => {
                        sub = None;
                        let _ = tx.send(DirectoryView::default());
                        debug!("directory subscription released");
                    }
                }
            }
            snapshot = next_snapshot(&mut sub) => {
                let snapshot = match snapshot {
                    Some(snapshot) => snapshot,
                    None => break,
                };
                let user = match user.as_ref() {
                    Some(user) => user,
                    None => continue,
                };
                let entries = derive_entries(snapshot, user);
                let _ = tx.send(DirectoryView {
                    loading: false,
                    entries,
                });
            }
        }
    }
}

async fn next_snapshot(sub: &mut Option<Subscription>) -> Option<Snapshot> {
    match sub {
        Some(sub) => sub.next().await,
        None => std::future::pending().await,
    }
}

/// Recompute the visible, ordered list from a whole-state snapshot.
fn derive_entries(snapshot: Snapshot, user: &UserId) -> Vec<DirectoryEntry> {
    let map = match snapshot {
        Some(Value::Object(map)) => map,
        _ => return Vec::new(),
    };

    let mut entries: Vec<DirectoryEntry> = Vec::with_capacity(map.len());
    for (id, value) in map {
        let chat: Chat = match serde_json::from_value(value) {
            Ok(chat) => chat,
            Err(err) => {
                warn!(id = %id, error = %err, "skipping malformed chat record");
                continue;
            }
        };
        if chat.visible_to(user) {
            entries.push(DirectoryEntry {
                id: ChatId::new(id),
                chat,
            });
        }
    }

    // Newest activity first; chats without messages report 0 and sort last.
    // Ties break on ascending chat id so recomputed lists stay stable.
    entries.sort_by(|a, b| {
        b.chat
            .last_activity()
            .cmp(&a.chat.last_activity())
            .then_with(|| a.id.cmp(&b.id))
    });
    entries
}
