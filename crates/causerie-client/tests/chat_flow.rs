//! End-to-end flow over the in-process backend: register, create chats,
//! send messages, and watch the synchronized views react.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tempfile::TempDir;
use tokio::sync::{mpsc, watch};

use causerie_backend::{LocalBlobStore, MemoryAuth, MemoryStore};
use causerie_client::{
    create_chat, ChatDirectory, ClientConfig, ClientContext, ConversationSync, MessageComposer,
    Notice, SessionState, SubmitOutcome,
};
use causerie_shared::constants::MAX_IMAGE_BYTES;
use causerie_shared::{ChatKind, UserId};

async fn test_ctx() -> (
    Arc<ClientContext>,
    mpsc::UnboundedReceiver<Notice>,
    Arc<MemoryAuth>,
    Arc<MemoryStore>,
    TempDir,
) {
    let dir = TempDir::new().unwrap();
    let auth = Arc::new(MemoryAuth::new());
    let store = Arc::new(MemoryStore::new());
    let blobs = Arc::new(
        LocalBlobStore::new(dir.path().to_path_buf(), MAX_IMAGE_BYTES)
            .await
            .unwrap(),
    );
    let (ctx, notices) =
        ClientContext::new(auth.clone(), store.clone(), blobs, ClientConfig::default());
    (ctx, notices, auth, store, dir)
}

async fn wait_until<T: Clone + Send + Sync + 'static>(
    rx: &mut watch::Receiver<T>,
    pred: impl FnMut(&T) -> bool,
) -> T {
    tokio::time::timeout(Duration::from_secs(1), rx.wait_for(pred))
        .await
        .expect("timed out waiting for view")
        .expect("sync task gone")
        .clone()
}

#[tokio::test]
async fn test_public_chat_is_visible_to_unrelated_users() {
    let (ctx, _notices, _auth, _store, _dir) = test_ctx().await;
    let session = SessionState::new(ctx.clone());

    session
        .register("alice@example.com", "secret1", "Alice")
        .await
        .unwrap();
    let general = create_chat(&ctx, "General", ChatKind::Public, &[])
        .await
        .unwrap();

    // Alice sees it.
    {
        let directory = ChatDirectory::open(ctx.clone());
        let mut rx = directory.watch();
        let view = wait_until(&mut rx, |v| !v.loading).await;
        assert!(view.entries.iter().any(|e| e.id == general));
    }

    // A freshly registered, unrelated user sees it too.
    session.logout().await.unwrap();
    session
        .register("bob@example.com", "secret1", "Bob")
        .await
        .unwrap();
    let directory = ChatDirectory::open(ctx.clone());
    let mut rx = directory.watch();
    let view = wait_until(&mut rx, |v| !v.loading).await;
    assert!(view.entries.iter().any(|e| e.id == general));
    assert_eq!(view.entries[0].chat.name, "General");
}

#[tokio::test]
async fn test_private_chat_hidden_from_outsiders() {
    let (ctx, _notices, _auth, _store, _dir) = test_ctx().await;
    let session = SessionState::new(ctx.clone());

    session
        .register("alice@example.com", "secret1", "Alice")
        .await
        .unwrap();
    let bob_id = UserId::new("bob-placeholder");
    let pair = create_chat(&ctx, "Pair", ChatKind::Private, &[bob_id])
        .await
        .unwrap();

    session.logout().await.unwrap();
    session
        .register("mallory@example.com", "secret1", "Mallory")
        .await
        .unwrap();

    let directory = ChatDirectory::open(ctx.clone());
    let mut rx = directory.watch();
    let view = wait_until(&mut rx, |v| !v.loading).await;
    assert!(view.entries.iter().all(|e| e.id != pair));
}

#[tokio::test]
async fn test_send_flow_updates_conversation_and_directory() {
    let (ctx, _notices, _auth, _store, _dir) = test_ctx().await;
    let session = SessionState::new(ctx.clone());

    session
        .register("alice@example.com", "secret1", "Alice")
        .await
        .unwrap();
    let quiet = create_chat(&ctx, "Quiet", ChatKind::Public, &[]).await.unwrap();
    let general = create_chat(&ctx, "General", ChatKind::Public, &[])
        .await
        .unwrap();

    let directory = ChatDirectory::open(ctx.clone());
    let mut dir_rx = directory.watch();
    wait_until(&mut dir_rx, |v| v.entries.len() == 2).await;

    let sync = ConversationSync::open(ctx.clone(), general.clone());
    let mut conv_rx = sync.watch();
    wait_until(&mut conv_rx, |v| !v.loading).await;

    // Text plus a 2 MiB PNG attachment.
    let mut composer = MessageComposer::new(ctx.clone(), general.clone());
    composer.set_text("hi");
    composer
        .attach_image(
            "photo.png",
            "image/png",
            Bytes::from(vec![1u8; 2 * 1024 * 1024]),
        )
        .unwrap();
    let outcome = composer.submit().await.unwrap();
    assert!(matches!(outcome, SubmitOutcome::Sent(_)));

    // The conversation view picks the message up.
    let view = wait_until(&mut conv_rx, |v| v.messages.len() == 1).await;
    assert_eq!(view.messages[0].text, "hi");
    assert_eq!(view.messages[0].sender_name, "Alice");
    assert!(view.messages[0]
        .image_url
        .as_deref()
        .is_some_and(|url| !url.is_empty()));

    // The directory reorders: the active chat now leads with summary "hi".
    let view = wait_until(&mut dir_rx, |v| {
        v.entries
            .first()
            .is_some_and(|e| e.chat.last_message.is_some())
    })
    .await;
    assert_eq!(view.entries[0].id, general);
    assert_eq!(
        view.entries[0]
            .chat
            .last_message
            .as_ref()
            .map(|m| m.text.as_str()),
        Some("hi")
    );
    assert_eq!(view.entries[1].id, quiet);
}
