//! Shared client context handed to every component.
//!
//! There is no global "current user" state: the identity lives with the
//! auth service and every component reads it through the context it was
//! given. The context is created once at startup and torn down with the
//! application.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use causerie_backend::{AuthService, AuthUser, BlobStore, RealtimeStore};

use crate::config::ClientConfig;
use crate::notices::{Notice, NoticeSender};

/// The collaborator services, configuration, and notification channel every
/// client component depends on.
pub struct ClientContext {
    pub auth: Arc<dyn AuthService>,
    pub store: Arc<dyn RealtimeStore>,
    pub blobs: Arc<dyn BlobStore>,
    config: ClientConfig,
    notices: NoticeSender,
}

impl ClientContext {
    /// Build the context. The returned receiver carries every user-facing
    /// notification the components emit.
    pub fn new(
        auth: Arc<dyn AuthService>,
        store: Arc<dyn RealtimeStore>,
        blobs: Arc<dyn BlobStore>,
        config: ClientConfig,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<Notice>) {
        let (notices, rx) = NoticeSender::channel();
        (
            Arc::new(Self {
                auth,
                store,
                blobs,
                config,
                notices,
            }),
            rx,
        )
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn notices(&self) -> &NoticeSender {
        &self.notices
    }

    /// Snapshot of the signed-in identity, if any.
    pub fn identity(&self) -> Option<AuthUser> {
        self.auth.current_identity()
    }

    /// Channel carrying identity changes; `None` while signed out.
    pub fn identity_changes(&self) -> watch::Receiver<Option<AuthUser>> {
        self.auth.identity_changes()
    }
}
