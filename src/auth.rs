//! Demo login against a static allow-list.
//!
//! Cosmetic only: there are no tokens and nothing is checked after login.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use tracing::info;

use crate::error::AuthError;

pub const MIN_PASSWORD_LEN: usize = 8;

/// Shown when credentials do not match.
pub const DEMO_HINT: &str = "ospecialist@corespectrum.com / Demo@1234";

const ALLOWED: &[(&str, &str)] = &[
    ("ospecialist@corespectrum.com", "Demo@1234"),
    ("hradmin@corespectrum.com", "Demo@1234"),
];

/// A logged-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub email: String,
}

/// Check credentials in order: presence, email shape, password length,
/// allow-list.
pub fn validate(email: &str, password: &SecretString) -> Result<Session, AuthError> {
    let email = email.trim();
    let password = password.expose_secret();

    if email.is_empty() || password.is_empty() {
        return Err(AuthError::MissingCredentials);
    }
    if !email.contains('@') || !email.contains('.') {
        return Err(AuthError::InvalidEmail);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::PasswordTooShort {
            min: MIN_PASSWORD_LEN,
        });
    }

    let allowed = ALLOWED
        .iter()
        .any(|(e, p)| *e == email && *p == password);
    if !allowed {
        return Err(AuthError::InvalidCredentials {
            hint: DEMO_HINT.to_string(),
        });
    }

    Ok(Session {
        email: email.to_string(),
    })
}

/// `validate` after a simulated round trip.
pub async fn login(
    email: &str,
    password: &SecretString,
    delay: Duration,
) -> Result<Session, AuthError> {
    tokio::time::sleep(delay).await;
    let session = validate(email, password)?;
    info!(email = %session.email, "Logged in");
    Ok(session)
}
