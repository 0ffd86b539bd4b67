//! User-facing notifications.
//!
//! Operations report their outcome through this side channel independently
//! of the error they return; the UI renders each [`Notice`] as a transient
//! toast. Emission never fails the emitting operation.

use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub body: String,
    pub severity: Severity,
}

#[derive(Clone)]
pub struct NoticeSender {
    tx: mpsc::UnboundedSender<Notice>,
}

impl NoticeSender {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn info(&self, title: &str, body: impl Into<String>) {
        self.emit(Notice {
            title: title.to_string(),
            body: body.into(),
            severity: Severity::Info,
        });
    }

    pub fn error(&self, title: &str, body: impl Into<String>) {
        self.emit(Notice {
            title: title.to_string(),
            body: body.into(),
            severity: Severity::Error,
        });
    }

    fn emit(&self, notice: Notice) {
        if self.tx.send(notice).is_err() {
            tracing::debug!("notice receiver gone, dropping notification");
        }
    }
}
