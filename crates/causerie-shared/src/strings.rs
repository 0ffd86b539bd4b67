//! User-facing notification copy.
//!
//! Every string shown to the user lives here so the classification of a
//! failure into a message stays in one place (and so tests can assert the
//! exact copy a notice carries).

use crate::error::AuthError;

// -- Sign-in --
pub const LOGIN_OK_TITLE: &str = "Welcome back!";
pub const LOGIN_OK_BODY: &str = "You are now signed in.";
pub const LOGIN_FAILED_TITLE: &str = "Sign-in failed";
pub const LOGIN_FAILED_BODY: &str = "Could not sign in. Try again.";
pub const BAD_CREDENTIALS_BODY: &str = "Incorrect email or password.";
pub const RATE_LIMITED_BODY: &str = "Too many sign-in attempts. Try again later.";
pub const ACCOUNT_DISABLED_BODY: &str = "This account has been disabled.";

// -- Registration --
pub const REGISTER_OK_TITLE: &str = "Account created!";
pub const REGISTER_OK_BODY: &str = "You registered successfully.";
pub const REGISTER_FAILED_TITLE: &str = "Registration failed";
pub const REGISTER_FAILED_BODY: &str = "Could not register. Try again.";
pub const EMAIL_IN_USE_BODY: &str = "This email is already used by another account.";
pub const WEAK_PASSWORD_BODY: &str = "The password must be at least 6 characters.";
pub const MALFORMED_EMAIL_BODY: &str = "Invalid email address.";

// -- Sign-out --
pub const LOGOUT_OK_TITLE: &str = "Signed out";
pub const LOGOUT_OK_BODY: &str = "You signed out of your account.";
pub const LOGOUT_FAILED_TITLE: &str = "Sign-out failed";

// -- Messaging --
pub const GENERIC_ERROR_TITLE: &str = "Error";
pub const SEND_FAILED_BODY: &str = "Could not send the message. Try again.";
/// Summary text shown when a message carries an image but no text.
pub const IMAGE_SENT_PLACEHOLDER: &str = "Image sent";
/// Sender name used when the identity has no display name.
pub const SENDER_NAME_FALLBACK: &str = "User";

// -- Chat creation --
pub const CHAT_CREATED_TITLE: &str = "Chat created";
pub const CHAT_CREATE_FAILED_TITLE: &str = "Failed to create chat";
pub const CHAT_CREATE_FAILED_BODY: &str = "An error occurred. Please try again.";

pub fn chat_created_body(kind: crate::types::ChatKind) -> String {
    format!("Your {kind} chat has been created successfully")
}

/// Map a sign-in failure to its notification body.
pub fn sign_in_failure_body(err: &AuthError) -> &'static str {
    match err {
        AuthError::WrongCredentials | AuthError::UnknownAccount => BAD_CREDENTIALS_BODY,
        AuthError::RateLimited => RATE_LIMITED_BODY,
        AuthError::AccountDisabled => ACCOUNT_DISABLED_BODY,
        _ => LOGIN_FAILED_BODY,
    }
}

/// Map a registration failure to its notification body.
pub fn registration_failure_body(err: &AuthError) -> &'static str {
    match err {
        AuthError::EmailInUse => EMAIL_IN_USE_BODY,
        AuthError::WeakPassword => WEAK_PASSWORD_BODY,
        AuthError::MalformedEmail => MALFORMED_EMAIL_BODY,
        _ => REGISTER_FAILED_BODY,
    }
}
