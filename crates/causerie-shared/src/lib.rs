//! # causerie-shared
//!
//! Domain types shared by every Causerie crate: identifiers, the record
//! structs mirrored in the remote directory store, the error taxonomy, and
//! the localized user-facing string table.

pub mod constants;
pub mod models;
pub mod strings;
pub mod types;

mod error;

pub use error::{AuthError, BackendError, CauserieError, ValidationError};
pub use models::{Chat, LastMessage, Message, UserProfile};
pub use types::{ChatId, ChatKind, MessageId, UserId};
