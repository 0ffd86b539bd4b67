//! Contract of the authentication service.

use async_trait::async_trait;
use tokio::sync::watch;

use causerie_shared::{AuthError, UserId};

/// The signed-in identity as reported by the auth service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: UserId,
    pub email: String,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

#[async_trait]
pub trait AuthService: Send + Sync + 'static {
    /// Register a new account. On success the account is also signed in and
    /// the identity channel fires.
    async fn create_account(&self, email: &str, password: &str) -> Result<AuthUser, AuthError>;

    /// Sign in with email and password. Success is observed through the
    /// identity channel, not the return value.
    async fn sign_in(&self, email: &str, password: &str) -> Result<(), AuthError>;

    /// Sign out the current identity.
    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Update the display name of the signed-in identity.
    async fn update_display_name(&self, name: &str) -> Result<(), AuthError>;

    /// Channel carrying the current identity; `None` while signed out.
    fn identity_changes(&self) -> watch::Receiver<Option<AuthUser>>;

    /// Snapshot of the current identity.
    fn current_identity(&self) -> Option<AuthUser> {
        self.identity_changes().borrow().clone()
    }
}
