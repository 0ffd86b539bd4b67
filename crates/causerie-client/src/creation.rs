//! Conversation creation.
//!
//! Validation happens entirely before the write: the name must be non-empty
//! and the participant selection must match the chat kind. The record is
//! written as a single insert under a store-assigned key; the subscriptions
//! elsewhere observe it asynchronously.

use std::collections::BTreeMap;

use causerie_backend::RealtimeStore;
use chrono::Utc;
use serde_json::Value;
use tracing::{error, info, warn};

use causerie_shared::constants::{CHATS_PATH, USERS_PATH};
use causerie_shared::{
    strings, AuthError, BackendError, CauserieError, Chat, ChatId, ChatKind, UserId, UserProfile,
    ValidationError,
};

use crate::context::ClientContext;

/// Create a new conversation and return its id so the caller can navigate
/// there. On failure the caller stays on the creation dialog.
pub async fn create_chat(
    ctx: &ClientContext,
    name: &str,
    kind: ChatKind,
    selected: &[UserId],
) -> Result<ChatId, CauserieError> {
    let user = match ctx.identity() {
        Some(user) => user,
        None => return Err(AuthError::NotSignedIn.into()),
    };

    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyField("name").into());
    }
    match kind {
        ChatKind::Private if selected.len() != 1 => {
            return Err(ValidationError::ParticipantSelection {
                kind,
                selected: selected.len(),
            }
            .into());
        }
        ChatKind::Group if selected.is_empty() => {
            return Err(ValidationError::ParticipantSelection {
                kind,
                selected: 0,
            }
            .into());
        }
        _ => {}
    }

    // Public chats are visible to everyone regardless of membership, so the
    // selection is ignored and the map stays empty.
    let participants: BTreeMap<UserId, bool> = match kind {
        ChatKind::Public => BTreeMap::new(),
        _ => std::iter::once(user.id.clone())
            .chain(selected.iter().cloned())
            .map(|id| (id, true))
            .collect(),
    };

    let chat = Chat {
        kind,
        name: name.to_string(),
        participants,
        created_by: user.id.clone(),
        created_at: Utc::now().timestamp_millis(),
        last_message: None,
    };

    let result: Result<ChatId, BackendError> = async {
        let key = ctx.store.push_key(CHATS_PATH).await?;
        let record = serde_json::to_value(&chat)?;
        ctx.store.write(&format!("{CHATS_PATH}/{key}"), record).await?;
        Ok(ChatId::new(key))
    }
    .await;

    match result {
        Ok(id) => {
            info!(chat = %id, kind = %kind, "chat created");
            ctx.notices()
                .info(strings::CHAT_CREATED_TITLE, strings::chat_created_body(kind));
            Ok(id)
        }
        Err(err) => {
            error!(kind = %kind, error = %err, "chat creation failed");
            ctx.notices().error(
                strings::CHAT_CREATE_FAILED_TITLE,
                strings::CHAT_CREATE_FAILED_BODY,
            );
            Err(err.into())
        }
    }
}

/// Fetch the registered users offered in the participant picker, excluding
/// the caller. One-shot read; the picker does not live-update.
pub async fn list_participants(ctx: &ClientContext) -> Result<Vec<UserProfile>, CauserieError> {
    let me = match ctx.identity() {
        Some(user) => user,
        None => return Err(AuthError::NotSignedIn.into()),
    };

    let snapshot = ctx.store.read(USERS_PATH).await?;
    let map = match snapshot {
        Some(Value::Object(map)) => map,
        _ => return Ok(Vec::new()),
    };

    let mut profiles = Vec::with_capacity(map.len());
    for (uid, value) in map {
        if uid == me.id.as_str() {
            continue;
        }
        match serde_json::from_value::<UserProfile>(value) {
            Ok(mut profile) => {
                profile.id = UserId::new(uid);
                profiles.push(profile);
            }
            Err(err) => {
                warn!(uid = %uid, error = %err, "skipping malformed profile record");
            }
        }
    }
    Ok(profiles)
}
