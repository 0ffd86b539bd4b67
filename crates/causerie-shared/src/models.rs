//! Record structs mirrored in the remote directory store.
//!
//! Field names follow the remote camelCase schema, so every struct can be
//! serialized straight into a store write. Records are stored under their
//! key, so the key itself is not part of the stored value; where a struct
//! carries an id field it is filled in from the key when a snapshot is
//! flattened.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{ChatId, ChatKind, MessageId, UserId};

// ---------------------------------------------------------------------------
// UserProfile
// ---------------------------------------------------------------------------

/// A registered user, mirrored into the directory store at `users/<uid>`
/// when the account is created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// The account id (the store key; never part of the stored record).
    #[serde(skip, default)]
    pub id: UserId,
    pub email: String,
    /// Optional human-readable display name.
    pub display_name: Option<String>,
    /// Optional avatar reference.
    pub photo_url: Option<String>,
    /// When the account registered (milliseconds since epoch,
    /// server-assigned).
    #[serde(default)]
    pub created_at: i64,
}

impl UserProfile {
    /// Name shown for this user, falling back to the email local-part.
    pub fn label(&self) -> String {
        match &self.display_name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => self
                .email
                .split('@')
                .next()
                .unwrap_or(self.email.as_str())
                .to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

/// The last-message preview cached on a chat for list display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LastMessage {
    pub text: String,
    /// Milliseconds since epoch.
    pub timestamp: i64,
}

/// A conversation record stored at `chats/<id>`.
///
/// The participant map is a set-as-mapping: a present key always maps to
/// `true`, absence means non-member. Public chats carry an empty map;
/// membership is irrelevant to their visibility.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    #[serde(rename = "type")]
    pub kind: ChatKind,
    pub name: String,
    #[serde(default)]
    pub participants: BTreeMap<UserId, bool>,
    pub created_by: UserId,
    /// Milliseconds since epoch.
    pub created_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_message: Option<LastMessage>,
}

impl Chat {
    /// Whether `user` appears in the participant map with a `true` flag.
    pub fn is_member(&self, user: &UserId) -> bool {
        self.participants.get(user).copied().unwrap_or(false)
    }

    /// Whether this chat belongs in `user`'s visible list: public chats are
    /// visible to everyone, all others only to participants.
    pub fn visible_to(&self, user: &UserId) -> bool {
        self.kind == ChatKind::Public || self.is_member(user)
    }

    /// Last-message timestamp used for list ordering. Chats that have never
    /// seen a message report 0 and therefore sort after every active chat.
    pub fn last_activity(&self) -> i64 {
        self.last_message.as_ref().map(|m| m.timestamp).unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A single chat message, stored at `messages/<chatId>/<msgId>`.
///
/// Immutable once written. The id is store-assigned and also denormalized
/// into the record; the store key stays authoritative when flattening a
/// snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Store-assigned; the key stays authoritative when a snapshot is
    /// flattened, so a missing field is tolerated.
    #[serde(default)]
    pub id: MessageId,
    /// May be empty only when an attachment is present.
    pub text: String,
    pub sender_id: UserId,
    /// Sender display name, denormalized at send time.
    pub sender_name: String,
    /// Client-assigned milliseconds since epoch.
    pub timestamp: i64,
    /// Retrieval URL of the image attachment, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}
