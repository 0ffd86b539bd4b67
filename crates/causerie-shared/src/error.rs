use thiserror::Error;

use crate::types::ChatKind;

#[derive(Error, Debug)]
pub enum CauserieError {
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

/// Failures of the authentication service, classified so the client can map
/// each reason to user-facing copy.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Wrong email or password")]
    WrongCredentials,

    #[error("No account for this email")]
    UnknownAccount,

    #[error("Account is disabled")]
    AccountDisabled,

    #[error("Too many attempts")]
    RateLimited,

    #[error("Email is already registered")]
    EmailInUse,

    #[error("Password is too short")]
    WeakPassword,

    #[error("Malformed email address")]
    MalformedEmail,

    #[error("No identity is signed in")]
    NotSignedIn,

    #[error("Auth service unavailable: {0}")]
    Unavailable(String),
}

/// Input rejected before any remote call. Carries the offending field so a
/// caller can surface the error inline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field is empty: {0}")]
    EmptyField(&'static str),

    #[error("Attachment is not an image: {0}")]
    NotAnImage(String),

    #[error("Image too large: {size} bytes (max {max})")]
    ImageTooLarge { size: usize, max: usize },

    #[error("Invalid participant selection for {kind} chat: {selected} selected")]
    ParticipantSelection { kind: ChatKind, selected: usize },
}

/// Transient failure of a remote collaborator on a read or write.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Record not found")]
    NotFound,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Blob too large: {size} bytes (max {max})")]
    BlobTooLarge { size: usize, max: usize },
}
