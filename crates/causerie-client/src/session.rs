//! Session state: login, registration, and logout.
//!
//! The identity itself is owned by the auth service; these operations only
//! drive it and report their outcome. Success is observed through the
//! identity channel, never a return value.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{info, warn};

use causerie_backend::{server_timestamp, AuthService, RealtimeStore};
use causerie_shared::constants::{MIN_PASSWORD_LEN, USERS_PATH};
use causerie_shared::{strings, AuthError, CauserieError, ValidationError};

use crate::context::ClientContext;

pub struct SessionState {
    ctx: Arc<ClientContext>,
}

impl SessionState {
    pub fn new(ctx: Arc<ClientContext>) -> Self {
        Self { ctx }
    }

    /// Sign in with email and password.
    ///
    /// Empty fields are rejected inline before any remote call; auth
    /// failures are classified into a failure notice.
    pub async fn login(&self, email: &str, password: &str) -> Result<(), CauserieError> {
        if email.trim().is_empty() {
            return Err(ValidationError::EmptyField("email").into());
        }
        if password.is_empty() {
            return Err(ValidationError::EmptyField("password").into());
        }

        match self.ctx.auth.sign_in(email, password).await {
            Ok(()) => {
                info!(email, "signed in");
                self.ctx
                    .notices()
                    .info(strings::LOGIN_OK_TITLE, strings::LOGIN_OK_BODY);
                Ok(())
            }
            Err(err) => {
                warn!(email, error = %err, "sign-in failed");
                self.ctx
                    .notices()
                    .error(strings::LOGIN_FAILED_TITLE, strings::sign_in_failure_body(&err));
                Err(err.into())
            }
        }
    }

    /// Register a new account and mirror its profile into the directory
    /// store.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<(), CauserieError> {
        if email.trim().is_empty() {
            return Err(ValidationError::EmptyField("email").into());
        }
        if password.is_empty() {
            return Err(ValidationError::EmptyField("password").into());
        }
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyField("name").into());
        }

        // Enforced before the account request goes anywhere near the wire.
        if password.len() < MIN_PASSWORD_LEN {
            let err = AuthError::WeakPassword;
            self.ctx.notices().error(
                strings::REGISTER_FAILED_TITLE,
                strings::registration_failure_body(&err),
            );
            return Err(err.into());
        }

        let user = match self.ctx.auth.create_account(email, password).await {
            Ok(user) => user,
            Err(err) => {
                warn!(email, error = %err, "registration failed");
                self.ctx.notices().error(
                    strings::REGISTER_FAILED_TITLE,
                    strings::registration_failure_body(&err),
                );
                return Err(err.into());
            }
        };

        if let Err(err) = self.ctx.auth.update_display_name(name).await {
            warn!(email, error = %err, "setting display name failed");
            self.ctx.notices().error(
                strings::REGISTER_FAILED_TITLE,
                strings::registration_failure_body(&err),
            );
            return Err(err.into());
        }

        // Mirror the account into the directory store so other users can
        // find it when picking chat participants.
        let record = json!({
            "email": email,
            "displayName": name,
            "photoUrl": Value::Null,
            "createdAt": server_timestamp(),
        });
        if let Err(err) = self
            .ctx
            .store
            .write(&format!("{USERS_PATH}/{}", user.id), record)
            .await
        {
            warn!(email, error = %err, "profile mirror write failed");
            self.ctx
                .notices()
                .error(strings::REGISTER_FAILED_TITLE, strings::REGISTER_FAILED_BODY);
            return Err(err.into());
        }

        info!(email, id = %user.id, "account registered");
        self.ctx
            .notices()
            .info(strings::REGISTER_OK_TITLE, strings::REGISTER_OK_BODY);
        Ok(())
    }

    /// Sign out the current identity. Failures (backend unavailable) are
    /// surfaced once and not retried.
    pub async fn logout(&self) -> Result<(), CauserieError> {
        match self.ctx.auth.sign_out().await {
            Ok(()) => {
                self.ctx
                    .notices()
                    .info(strings::LOGOUT_OK_TITLE, strings::LOGOUT_OK_BODY);
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "sign-out failed");
                self.ctx
                    .notices()
                    .error(strings::LOGOUT_FAILED_TITLE, err.to_string());
                Err(err.into())
            }
        }
    }
}
