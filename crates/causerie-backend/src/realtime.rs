//! Contract of the realtime directory store.
//!
//! The store is keyed hierarchical storage addressed by `/`-separated paths
//! (`chats/<id>`, `messages/<chatId>/<msgId>`). Subscriptions are push-based
//! and deliver whole-state snapshots, never deltas: consumers recompute
//! derived state from scratch on every callback.

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::watch;

use causerie_shared::BackendError;

/// A whole-state view of a subscribed path. `None` means the path is absent.
pub type Snapshot = Option<Value>;

/// Sentinel the store resolves to its own clock (milliseconds since epoch)
/// at write time.
pub fn server_timestamp() -> Value {
    serde_json::json!({ ".sv": "timestamp" })
}

#[async_trait]
pub trait RealtimeStore: Send + Sync + 'static {
    /// One-shot read of the current value at `path`.
    async fn read(&self, path: &str) -> Result<Snapshot, BackendError>;

    /// Replace the value at `path`. Writing `Value::Null` removes the node.
    async fn write(&self, path: &str, value: Value) -> Result<(), BackendError>;

    /// Shallow-merge `fields` into the object at `path`.
    async fn update(&self, path: &str, fields: Map<String, Value>) -> Result<(), BackendError>;

    /// Allocate a fresh child key under `path`. Keys are monotonic: lexical
    /// order matches allocation order.
    async fn push_key(&self, path: &str) -> Result<String, BackendError>;

    /// Open a push subscription on `path`. The current snapshot is delivered
    /// first; every subsequent change under (or above) the path delivers a
    /// fresh whole-state snapshot.
    fn subscribe(&self, path: &str) -> Subscription;
}

/// Handle to an active store subscription.
///
/// Dropping the handle releases the remote listener; holding it leaks
/// nothing but the one registered callback it stands for.
pub struct Subscription {
    rx: watch::Receiver<Snapshot>,
    _release: Box<dyn std::any::Any + Send>,
}

impl Subscription {
    /// Wrap a snapshot channel together with an implementation-specific
    /// guard whose `Drop` releases the listener.
    pub fn new(mut rx: watch::Receiver<Snapshot>, release: Box<dyn std::any::Any + Send>) -> Self {
        // The snapshot present at subscribe time counts as the first delivery.
        rx.mark_changed();
        Self {
            rx,
            _release: release,
        }
    }

    /// Wait for the next snapshot. Returns `None` once the store side has
    /// gone away. Cancel-safe, so it can sit in a `select!` arm.
    pub async fn next(&mut self) -> Option<Snapshot> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    /// The most recently delivered snapshot, without waiting.
    pub fn current(&self) -> Snapshot {
        self.rx.borrow().clone()
    }
}
