//! Message composition and submission.
//!
//! The composer owns the per-conversation draft (text + optional image).
//! Image validation happens when the attachment is picked, before anything
//! touches the network. Submission is a best-effort multi-step write:
//! allocate an id, upload the attachment, write the message record, update
//! the chat summary. A partial failure is not rolled back; the draft is
//! kept so the user can retry.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use serde_json::{json, Map};
use tracing::{error, info};

use causerie_backend::{AuthUser, BlobStore, RealtimeStore};
use causerie_shared::constants::{CHATS_PATH, CHAT_IMAGES_PATH, MESSAGES_PATH};
use causerie_shared::{strings, CauserieError, ChatId, Message, MessageId, ValidationError};

use crate::context::ClientContext;

/// Stand-in for a platform preview resource (an object URL in a browser
/// shell). Shared between the composer and whatever renders the preview;
/// released exactly once, on success, removal, or replacement — never on a
/// failed send, so the preview survives for the retry.
#[derive(Debug, Clone)]
pub struct PreviewHandle {
    released: Arc<AtomicBool>,
}

impl PreviewHandle {
    fn new() -> Self {
        Self {
            released: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn release(&self) {
        self.released.store(true, Ordering::SeqCst);
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

/// A validated image attachment held in the draft.
#[derive(Debug, Clone)]
pub struct ImageDraft {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
    pub preview: PreviewHandle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Sent(MessageId),
    /// Nothing to send (empty draft) or nobody signed in; no id was
    /// allocated and no write happened.
    Skipped,
}

pub struct MessageComposer {
    ctx: Arc<ClientContext>,
    chat_id: ChatId,
    text: String,
    image: Option<ImageDraft>,
}

impl MessageComposer {
    pub fn new(ctx: Arc<ClientContext>, chat_id: ChatId) -> Self {
        Self {
            ctx,
            chat_id,
            text: String::new(),
            image: None,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn image(&self) -> Option<&ImageDraft> {
        self.image.as_ref()
    }

    /// Accept an image into the draft. Content type and size are validated
    /// here, before any network operation; a previous attachment is
    /// replaced and its preview released.
    pub fn attach_image(
        &mut self,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        data: Bytes,
    ) -> Result<(), ValidationError> {
        let content_type = content_type.into();
        if !content_type.starts_with("image/") {
            return Err(ValidationError::NotAnImage(content_type));
        }
        let max = self.ctx.config().max_image_bytes;
        if data.len() > max {
            return Err(ValidationError::ImageTooLarge {
                size: data.len(),
                max,
            });
        }

        self.remove_image();
        self.image = Some(ImageDraft {
            file_name: file_name.into(),
            content_type,
            data,
            preview: PreviewHandle::new(),
        });
        Ok(())
    }

    /// Drop the attachment and release its preview resource.
    pub fn remove_image(&mut self) {
        if let Some(image) = self.image.take() {
            image.preview.release();
        }
    }

    /// Submit the draft.
    ///
    /// An empty draft or a missing identity is a silent no-op. On failure a
    /// generic notice is emitted, the detail is logged, and the draft stays
    /// untouched; on success the text clears and the preview is released.
    pub async fn submit(&mut self) -> Result<SubmitOutcome, CauserieError> {
        let text = self.text.trim().to_string();
        if text.is_empty() && self.image.is_none() {
            return Ok(SubmitOutcome::Skipped);
        }
        let user = match self.ctx.identity() {
            Some(user) => user,
            None => return Ok(SubmitOutcome::Skipped),
        };

        match self.commit(&text, &user).await {
            Ok(id) => {
                self.text.clear();
                self.remove_image();
                Ok(SubmitOutcome::Sent(id))
            }
            Err(err) => {
                error!(chat = %self.chat_id, error = %err, "message send failed");
                self.ctx
                    .notices()
                    .error(strings::GENERIC_ERROR_TITLE, strings::SEND_FAILED_BODY);
                Err(err)
            }
        }
    }

    /// The commit sequence. Best effort: an attachment already uploaded when
    /// the record write fails stays uploaded.
    async fn commit(&self, text: &str, user: &AuthUser) -> Result<MessageId, CauserieError> {
        let messages_path = format!("{MESSAGES_PATH}/{}", self.chat_id);
        let key = self.ctx.store.push_key(&messages_path).await?;
        let timestamp = Utc::now().timestamp_millis();

        let image_url = match &self.image {
            Some(image) => {
                let blob_path = format!("{CHAT_IMAGES_PATH}/{}/{key}", self.chat_id);
                let handle = self.ctx.blobs.upload(&blob_path, image.data.clone()).await?;
                Some(self.ctx.blobs.retrieval_url(&handle).await?)
            }
            None => None,
        };

        let sender_name = display_name(user, &self.ctx);
        let message = Message {
            id: MessageId::new(key.clone()),
            text: text.to_string(),
            sender_id: user.id.clone(),
            sender_name,
            timestamp,
            image_url,
        };
        let record = serde_json::to_value(&message).map_err(causerie_shared::BackendError::from)?;
        self.ctx
            .store
            .write(&format!("{messages_path}/{key}"), record)
            .await?;

        // The summary carries the same timestamp as the message record. Two
        // concurrent senders race here; last write wins and stays.
        let summary_text = if text.is_empty() {
            strings::IMAGE_SENT_PLACEHOLDER.to_string()
        } else {
            text.to_string()
        };
        let mut fields = Map::new();
        fields.insert(
            "lastMessage".to_string(),
            json!({ "text": summary_text, "timestamp": timestamp }),
        );
        self.ctx
            .store
            .update(&format!("{CHATS_PATH}/{}", self.chat_id), fields)
            .await?;

        info!(chat = %self.chat_id, message = %key, sender = %user.id, "message sent");
        Ok(MessageId::new(key))
    }
}

fn display_name(user: &AuthUser, ctx: &ClientContext) -> String {
    match &user.display_name {
        Some(name) if !name.is_empty() => name.clone(),
        _ => ctx.config().display_name_fallback.clone(),
    }
}
