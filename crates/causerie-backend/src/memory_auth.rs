//! In-memory authentication service.
//!
//! Accounts live in a table keyed by email. Registration enforces the same
//! classification the hosted provider would (malformed email, weak password,
//! duplicate account); sign-in attempts are rate limited per email before
//! credentials are even looked at.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::info;
use uuid::Uuid;

use causerie_shared::constants::MIN_PASSWORD_LEN;
use causerie_shared::{AuthError, UserId};

use crate::auth::{AuthService, AuthUser};
use crate::rate_limit::RateLimiter;

struct Account {
    id: UserId,
    password: String,
    display_name: Option<String>,
    photo_url: Option<String>,
    disabled: bool,
}

pub struct MemoryAuth {
    accounts: Mutex<HashMap<String, Account>>,
    identity: watch::Sender<Option<AuthUser>>,
    // Retain a receiver so the channel stays open; otherwise `identity.send`
    // is a no-op (tokio's watch drops sends when there are no receivers).
    _identity_keepalive: watch::Receiver<Option<AuthUser>>,
    limiter: RateLimiter,
    offline: AtomicBool,
}

impl MemoryAuth {
    pub fn new() -> Self {
        let (identity, keepalive) = watch::channel(None);
        Self {
            accounts: Mutex::new(HashMap::new()),
            identity,
            _identity_keepalive: keepalive,
            limiter: RateLimiter::default(),
            offline: AtomicBool::new(false),
        }
    }

    /// Simulate the service being unreachable.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Administrative disable switch (for tests of the disabled-account
    /// classification).
    pub fn set_disabled(&self, email: &str, disabled: bool) {
        if let Some(account) = self.lock_accounts().get_mut(email) {
            account.disabled = disabled;
        }
    }

    fn lock_accounts(&self) -> MutexGuard<'_, HashMap<String, Account>> {
        match self.accounts.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn check_online(&self) -> Result<(), AuthError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(AuthError::Unavailable("auth service offline".to_string()));
        }
        Ok(())
    }
}

impl Default for MemoryAuth {
    fn default() -> Self {
        Self::new()
    }
}

fn check_email(email: &str) -> Result<(), AuthError> {
    let mut halves = email.split('@');
    match (halves.next(), halves.next(), halves.next()) {
        (Some(local), Some(domain), None) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(AuthError::MalformedEmail),
    }
}

#[async_trait]
impl AuthService for MemoryAuth {
    async fn create_account(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        self.check_online()?;
        check_email(email)?;
        if password.len() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword);
        }

        let user = {
            let mut accounts = self.lock_accounts();
            if accounts.contains_key(email) {
                return Err(AuthError::EmailInUse);
            }
            let id = UserId::new(Uuid::new_v4().to_string());
            accounts.insert(
                email.to_string(),
                Account {
                    id: id.clone(),
                    password: password.to_string(),
                    display_name: None,
                    photo_url: None,
                    disabled: false,
                },
            );
            AuthUser {
                id,
                email: email.to_string(),
                display_name: None,
                photo_url: None,
            }
        };

        info!(email, id = %user.id, "account created");
        // A freshly created account is signed in, like the hosted provider.
        let _ = self.identity.send(Some(user.clone()));
        Ok(user)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<(), AuthError> {
        self.check_online()?;
        if !self.limiter.check(email).await {
            return Err(AuthError::RateLimited);
        }

        let user = {
            let accounts = self.lock_accounts();
            let account = accounts.get(email).ok_or(AuthError::UnknownAccount)?;
            if account.disabled {
                return Err(AuthError::AccountDisabled);
            }
            if account.password != password {
                return Err(AuthError::WrongCredentials);
            }
            AuthUser {
                id: account.id.clone(),
                email: email.to_string(),
                display_name: account.display_name.clone(),
                photo_url: account.photo_url.clone(),
            }
        };

        info!(email, id = %user.id, "signed in");
        let _ = self.identity.send(Some(user));
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.check_online()?;
        info!("signed out");
        let _ = self.identity.send(None);
        Ok(())
    }

    async fn update_display_name(&self, name: &str) -> Result<(), AuthError> {
        self.check_online()?;
        let current = self
            .identity
            .borrow()
            .clone()
            .ok_or(AuthError::NotSignedIn)?;

        {
            let mut accounts = self.lock_accounts();
            if let Some(account) = accounts.get_mut(&current.email) {
                account.display_name = Some(name.to_string());
            }
        }

        let _ = self.identity.send(Some(AuthUser {
            display_name: Some(name.to_string()),
            ..current
        }));
        Ok(())
    }

    fn identity_changes(&self) -> watch::Receiver<Option<AuthUser>> {
        self.identity.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_register_then_sign_in() {
        let auth = MemoryAuth::new();
        let user = auth
            .create_account("alice@example.com", "secret1")
            .await
            .unwrap();
        assert_eq!(auth.current_identity().unwrap().id, user.id);

        auth.sign_out().await.unwrap();
        assert!(auth.current_identity().is_none());

        auth.sign_in("alice@example.com", "secret1").await.unwrap();
        assert_eq!(auth.current_identity().unwrap().email, "alice@example.com");
    }

    #[tokio::test]
    async fn test_registration_classification() {
        let auth = MemoryAuth::new();

        assert_eq!(
            auth.create_account("not-an-email", "secret1").await,
            Err(AuthError::MalformedEmail)
        );
        assert_eq!(
            auth.create_account("alice@example.com", "short").await,
            Err(AuthError::WeakPassword)
        );

        auth.create_account("alice@example.com", "secret1")
            .await
            .unwrap();
        assert_eq!(
            auth.create_account("alice@example.com", "another1").await,
            Err(AuthError::EmailInUse)
        );
    }

    #[tokio::test]
    async fn test_sign_in_classification() {
        let auth = MemoryAuth::new();
        auth.create_account("alice@example.com", "secret1")
            .await
            .unwrap();
        auth.sign_out().await.unwrap();

        assert_eq!(
            auth.sign_in("bob@example.com", "secret1").await,
            Err(AuthError::UnknownAccount)
        );
        assert_eq!(
            auth.sign_in("alice@example.com", "wrong-pass").await,
            Err(AuthError::WrongCredentials)
        );

        auth.set_disabled("alice@example.com", true);
        assert_eq!(
            auth.sign_in("alice@example.com", "secret1").await,
            Err(AuthError::AccountDisabled)
        );
    }

    #[tokio::test]
    async fn test_sign_in_rate_limited() {
        let auth = MemoryAuth::new();
        auth.create_account("alice@example.com", "secret1")
            .await
            .unwrap();

        let mut last = Ok(());
        for _ in 0..20 {
            last = auth.sign_in("alice@example.com", "wrong-pass").await;
            if last == Err(AuthError::RateLimited) {
                break;
            }
        }
        assert_eq!(last, Err(AuthError::RateLimited));
    }

    #[tokio::test]
    async fn test_update_display_name_propagates() {
        let auth = MemoryAuth::new();
        auth.create_account("alice@example.com", "secret1")
            .await
            .unwrap();

        auth.update_display_name("Alice").await.unwrap();
        assert_eq!(
            auth.current_identity().unwrap().display_name.as_deref(),
            Some("Alice")
        );

        auth.sign_out().await.unwrap();
        assert_eq!(
            auth.update_display_name("Nobody").await,
            Err(AuthError::NotSignedIn)
        );
    }

    #[tokio::test]
    async fn test_identity_watch_fires_on_changes() {
        let auth = MemoryAuth::new();
        let mut rx = auth.identity_changes();
        assert!(rx.borrow().is_none());

        auth.create_account("alice@example.com", "secret1")
            .await
            .unwrap();
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_some());

        auth.sign_out().await.unwrap();
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_none());
    }

    #[tokio::test]
    async fn test_offline_service_fails() {
        let auth = MemoryAuth::new();
        auth.create_account("alice@example.com", "secret1")
            .await
            .unwrap();
        auth.set_offline(true);
        assert!(matches!(
            auth.sign_out().await,
            Err(AuthError::Unavailable(_))
        ));
    }
}
