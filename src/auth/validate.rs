//! Client-side checks for the registration form.
//!
//! Mirrors the server's validation so obviously bad payloads are rejected
//! before a network round trip. The password policy matches the identity
//! API's rule exactly.

use thiserror::Error;

use crate::api::PASSWORD_POLICY_MESSAGE;
use crate::models::RegisterRequest;

/// Special characters the password policy accepts.
const SPECIAL_CHARACTERS: &str = "@#$%^&+=";

/// Minimum username length
const MIN_USERNAME_LENGTH: usize = 3;

/// Minimum password length
const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("username must be at least {MIN_USERNAME_LENGTH} characters")]
    UsernameTooShort,

    #[error("a valid email address is required")]
    InvalidEmail,

    #[error("{PASSWORD_POLICY_MESSAGE}")]
    WeakPassword,
}

/// Validate a registration payload before sending it.
pub fn validate_registration(payload: &RegisterRequest) -> Result<(), ValidationError> {
    if payload.username.chars().count() < MIN_USERNAME_LENGTH {
        return Err(ValidationError::UsernameTooShort);
    }
    if !is_plausible_email(&payload.email) {
        return Err(ValidationError::InvalidEmail);
    }
    if !password_meets_policy(&payload.password) {
        return Err(ValidationError::WeakPassword);
    }
    Ok(())
}

/// Loose structural check: one `@` with a non-empty local part and a domain
/// containing a dot. The server performs the authoritative validation.
fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && domain.contains('.')
        && !domain.contains('@')
}

/// Whether a password satisfies the policy: at least 8 characters drawn from
/// letters, digits and the accepted specials, with at least one of each of
/// lowercase, uppercase, digit and special.
pub fn password_meets_policy(password: &str) -> bool {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return false;
    }

    let allowed = |c: char| c.is_ascii_alphanumeric() || SPECIAL_CHARACTERS.contains(c);
    if !password.chars().all(allowed) {
        return false;
    }

    password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| SPECIAL_CHARACTERS.contains(c))
}

/// Password strength score in 25-point steps: length, lowercase, uppercase,
/// and digit-or-special each contribute 25.
pub fn password_strength(password: &str) -> u8 {
    if password.is_empty() {
        return 0;
    }

    let mut strength = 0;
    if password.chars().count() >= MIN_PASSWORD_LENGTH {
        strength += 25;
    }
    if password.chars().any(|c| c.is_ascii_lowercase()) {
        strength += 25;
    }
    if password.chars().any(|c| c.is_ascii_uppercase()) {
        strength += 25;
    }
    if password
        .chars()
        .any(|c| c.is_ascii_digit() || SPECIAL_CHARACTERS.contains(c))
    {
        strength += 25;
    }
    strength
}
