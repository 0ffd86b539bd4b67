//! # causerie-client
//!
//! The client-side core of Causerie: session state, the synchronized chat
//! directory and conversation views, message composition, and chat creation.
//! Everything talks to the remote collaborators through the capability
//! traits in `causerie-backend`, injected via [`context::ClientContext`].

pub mod composer;
pub mod config;
pub mod context;
pub mod conversation;
pub mod creation;
pub mod directory;
pub mod notices;
pub mod session;

pub use composer::{ImageDraft, MessageComposer, PreviewHandle, SubmitOutcome};
pub use config::ClientConfig;
pub use context::ClientContext;
pub use conversation::{ConversationSync, ConversationView, LeaveReason};
pub use creation::{create_chat, list_participants};
pub use directory::{ChatDirectory, DirectoryEntry, DirectoryView};
pub use notices::{Notice, NoticeSender, Severity};
pub use session::SessionState;

use tracing_subscriber::{fmt, EnvFilter};

/// Install the global tracing subscriber with the usual filter defaults.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("causerie_client=debug,causerie_backend=debug,warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
