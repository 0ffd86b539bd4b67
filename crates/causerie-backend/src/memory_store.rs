//! In-memory realtime store.
//!
//! A single JSON tree behind a mutex, with push-based listeners that receive
//! whole-state snapshots. This is the in-process stand-in for the hosted
//! store: it satisfies the [`RealtimeStore`] contract (including listener
//! release and the server-timestamp sentinel) but makes no attempt at
//! durability or replication.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::watch;
use tracing::debug;

use causerie_shared::BackendError;

use crate::realtime::{RealtimeStore, Snapshot, Subscription};

struct Listener {
    segments: Vec<String>,
    tx: watch::Sender<Snapshot>,
}

struct Inner {
    root: Map<String, Value>,
    listeners: HashMap<u64, Listener>,
    next_listener: u64,
    next_key: u64,
}

pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
    offline: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                root: Map::new(),
                listeners: HashMap::new(),
                next_listener: 0,
                next_key: 0,
            })),
            offline: AtomicBool::new(false),
        }
    }

    /// Simulate the service being unreachable: while set, every operation
    /// fails with [`BackendError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of currently registered listeners (for leak tests).
    pub fn listener_count(&self) -> usize {
        lock(&self.inner).listeners.len()
    }

    fn check_online(&self) -> Result<(), BackendError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(BackendError::Unavailable("store offline".to_string()));
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn lock(inner: &Arc<Mutex<Inner>>) -> MutexGuard<'_, Inner> {
    match inner.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn split_path(path: &str) -> Result<Vec<&str>, BackendError> {
    let segments: Vec<&str> = path.split('/').collect();
    if path.is_empty() || segments.iter().any(|s| s.is_empty()) {
        return Err(BackendError::InvalidPath(path.to_string()));
    }
    Ok(segments)
}

fn get_at<'a>(node: &'a Map<String, Value>, segments: &[&str]) -> Option<&'a Value> {
    let (first, rest) = segments.split_first()?;
    let child = node.get(*first)?;
    if rest.is_empty() {
        Some(child)
    } else {
        get_at(child.as_object()?, rest)
    }
}

/// Set `value` at the given path, creating intermediate objects as needed.
/// A `Null` value removes the node; emptied parents are pruned so an object
/// with no children reads back as absent.
fn set_at(node: &mut Map<String, Value>, segments: &[&str], value: Value) {
    let key = segments[0];
    if segments.len() == 1 {
        if value.is_null() {
            node.remove(key);
        } else {
            node.insert(key.to_string(), value);
        }
        return;
    }
    if value.is_null() && !node.contains_key(key) {
        return;
    }
    let child = node
        .entry(key.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !child.is_object() {
        *child = Value::Object(Map::new());
    }
    if let Value::Object(child_map) = child {
        set_at(child_map, &segments[1..], value);
        if child_map.is_empty() {
            node.remove(key);
        }
    }
}

/// Replace every `{".sv": "timestamp"}` sentinel with the store clock.
fn resolve_timestamps(value: &mut Value, now_ms: i64) {
    match value {
        Value::Object(map) => {
            if map.len() == 1 && map.get(".sv").and_then(Value::as_str) == Some("timestamp") {
                *value = Value::from(now_ms);
                return;
            }
            for child in map.values_mut() {
                resolve_timestamps(child, now_ms);
            }
        }
        Value::Array(items) => {
            for child in items {
                resolve_timestamps(child, now_ms);
            }
        }
        _ => {}
    }
}

/// A listener fires when the changed path is an ancestor or a descendant of
/// the subscribed path (equal common prefix).
fn related(subscribed: &[String], changed: &[&str]) -> bool {
    subscribed
        .iter()
        .zip(changed.iter())
        .all(|(a, b)| a == *b)
}

fn notify(inner: &Inner, changed: &[&str]) {
    for listener in inner.listeners.values() {
        if !related(&listener.segments, changed) {
            continue;
        }
        let segments: Vec<&str> = listener.segments.iter().map(String::as_str).collect();
        let snapshot = get_at(&inner.root, &segments).cloned();
        // Dropped receivers are cleaned up when the guard drops.
        let _ = listener.tx.send(snapshot);
    }
}

struct ReleaseGuard {
    inner: Arc<Mutex<Inner>>,
    id: u64,
}

impl Drop for ReleaseGuard {
    fn drop(&mut self) {
        lock(&self.inner).listeners.remove(&self.id);
        debug!(id = self.id, "listener released");
    }
}

#[async_trait]
impl RealtimeStore for MemoryStore {
    async fn read(&self, path: &str) -> Result<Snapshot, BackendError> {
        self.check_online()?;
        let segments = split_path(path)?;
        let inner = lock(&self.inner);
        Ok(get_at(&inner.root, &segments).cloned())
    }

    async fn write(&self, path: &str, value: Value) -> Result<(), BackendError> {
        self.check_online()?;
        let segments = split_path(path)?;
        let mut value = value;
        resolve_timestamps(&mut value, chrono::Utc::now().timestamp_millis());

        let mut inner = lock(&self.inner);
        set_at(&mut inner.root, &segments, value);
        debug!(path, "write");
        notify(&inner, &segments);
        Ok(())
    }

    async fn update(&self, path: &str, fields: Map<String, Value>) -> Result<(), BackendError> {
        self.check_online()?;
        let segments = split_path(path)?;
        let now_ms = chrono::Utc::now().timestamp_millis();

        let mut inner = lock(&self.inner);
        for (key, field) in fields {
            let mut field = field;
            resolve_timestamps(&mut field, now_ms);
            let mut child_segments = segments.clone();
            child_segments.push(key.as_str());
            set_at(&mut inner.root, &child_segments, field);
        }
        debug!(path, "update");
        notify(&inner, &segments);
        Ok(())
    }

    async fn push_key(&self, path: &str) -> Result<String, BackendError> {
        self.check_online()?;
        split_path(path)?;
        let mut inner = lock(&self.inner);
        inner.next_key += 1;
        // Zero-padded so lexical order matches allocation order.
        Ok(format!("{:016x}", inner.next_key))
    }

    fn subscribe(&self, path: &str) -> Subscription {
        let segments: Vec<String> = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        let mut inner = lock(&self.inner);
        let refs: Vec<&str> = segments.iter().map(String::as_str).collect();
        let current = get_at(&inner.root, &refs).cloned();

        let (tx, rx) = watch::channel(current);
        let id = inner.next_listener;
        inner.next_listener += 1;
        inner.listeners.insert(id, Listener { segments, tx });
        debug!(path, id, "listener registered");

        Subscription::new(
            rx,
            Box::new(ReleaseGuard {
                inner: Arc::clone(&self.inner),
                id,
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realtime::server_timestamp;
    use serde_json::json;

    #[tokio::test]
    async fn test_write_then_read() {
        let store = MemoryStore::new();
        store.write("chats/a", json!({"name": "general"})).await.unwrap();

        let snap = store.read("chats/a").await.unwrap();
        assert_eq!(snap, Some(json!({"name": "general"})));
        assert_eq!(store.read("chats/missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_subscribe_delivers_current_snapshot_first() {
        let store = MemoryStore::new();
        store.write("chats/a", json!({"name": "general"})).await.unwrap();

        let mut sub = store.subscribe("chats");
        let snap = sub.next().await.unwrap();
        assert_eq!(snap, Some(json!({"a": {"name": "general"}})));
    }

    #[tokio::test]
    async fn test_descendant_write_notifies_ancestor_listener() {
        let store = MemoryStore::new();
        let mut sub = store.subscribe("chats");
        assert_eq!(sub.next().await.unwrap(), None);

        store.write("chats/a/name", json!("general")).await.unwrap();
        let snap = sub.next().await.unwrap();
        assert_eq!(snap, Some(json!({"a": {"name": "general"}})));
    }

    #[tokio::test]
    async fn test_ancestor_write_notifies_descendant_listener() {
        let store = MemoryStore::new();
        let mut sub = store.subscribe("chats/a");
        assert_eq!(sub.next().await.unwrap(), None);

        store
            .write("chats", json!({"a": {"name": "general"}, "b": {"name": "other"}}))
            .await
            .unwrap();
        let snap = sub.next().await.unwrap();
        assert_eq!(snap, Some(json!({"name": "general"})));
    }

    #[tokio::test]
    async fn test_update_merges_shallowly() {
        let store = MemoryStore::new();
        store
            .write("chats/a", json!({"name": "general", "type": "public"}))
            .await
            .unwrap();

        let mut fields = Map::new();
        fields.insert("lastMessage".to_string(), json!({"text": "hi", "timestamp": 7}));
        store.update("chats/a", fields).await.unwrap();

        let snap = store.read("chats/a").await.unwrap().unwrap();
        assert_eq!(snap["name"], "general");
        assert_eq!(snap["lastMessage"]["text"], "hi");
    }

    #[tokio::test]
    async fn test_null_write_removes_and_prunes() {
        let store = MemoryStore::new();
        store.write("chats/a/name", json!("general")).await.unwrap();
        store.write("chats/a/name", Value::Null).await.unwrap();

        // The emptied parents are gone too.
        assert_eq!(store.read("chats").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_push_keys_are_monotonic() {
        let store = MemoryStore::new();
        let a = store.push_key("messages/c").await.unwrap();
        let b = store.push_key("messages/c").await.unwrap();
        assert!(a < b);
    }

    #[tokio::test]
    async fn test_dropping_subscription_releases_listener() {
        let store = MemoryStore::new();
        let sub = store.subscribe("chats");
        assert_eq!(store.listener_count(), 1);
        drop(sub);
        assert_eq!(store.listener_count(), 0);
    }

    #[tokio::test]
    async fn test_offline_store_fails_operations() {
        let store = MemoryStore::new();
        store.set_offline(true);
        assert!(store.write("chats/a", json!({})).await.is_err());
        assert!(store.read("chats/a").await.is_err());
        assert!(store.push_key("chats").await.is_err());
    }

    #[tokio::test]
    async fn test_server_timestamp_resolves_to_millis() {
        let store = MemoryStore::new();
        store
            .write("users/u1", json!({"createdAt": server_timestamp()}))
            .await
            .unwrap();

        let snap = store.read("users/u1").await.unwrap().unwrap();
        assert!(snap["createdAt"].as_i64().unwrap() > 1_500_000_000_000);
    }

    #[tokio::test]
    async fn test_empty_path_rejected() {
        let store = MemoryStore::new();
        assert!(store.read("").await.is_err());
        assert!(store.write("a//b", json!(1)).await.is_err());
    }
}
