//! Email + password accounts and bearer-token sessions.
//!
//! Passwords are hashed with bcrypt. Session tokens are random UUIDv4 hex;
//! the database only ever sees their SHA-256 digest, so a leaked database
//! does not leak live sessions.

use anyhow::Result;
use chrono::{Duration, Utc};
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

use crate::storage::{Storage, UserRow};

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),
    #[error("an account with this email already exists")]
    EmailTaken,
    /// Deliberately identical for unknown email and wrong password.
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("missing or invalid session token")]
    Unauthorized,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// An authenticated caller, resolved from a bearer token.
#[derive(Debug, Clone)]
pub struct AuthedUser {
    pub id: String,
    pub email: String,
    pub display_name: String,
}

impl From<UserRow> for AuthedUser {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            display_name: row.display_name,
        }
    }
}

/// Generate a new session token (UUID v4, hex without dashes = 32 chars).
fn generate_token() -> String {
    Uuid::new_v4().to_string().replace('-', "")
}

/// SHA-256 hex digest of a session token — the at-rest representation.
pub fn token_digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Extract the token from a `Bearer <token>` header value.
pub fn bearer_token(header_value: &str) -> Option<&str> {
    header_value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// True when the error bottoms out in a SQLite UNIQUE-constraint violation.
fn is_unique_violation(e: &anyhow::Error) -> bool {
    e.downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .is_some_and(|db| db.is_unique_violation())
}

fn validate_email(email: &str) -> Result<(), AuthError> {
    let ok = email.len() >= 3
        && email.contains('@')
        && !email.starts_with('@')
        && !email.ends_with('@')
        && !email.contains(char::is_whitespace);
    if ok {
        Ok(())
    } else {
        Err(AuthError::Validation("invalid email address".to_string()))
    }
}

/// Create a new account.
pub async fn register(
    storage: &Storage,
    email: &str,
    display_name: &str,
    password: &str,
) -> Result<UserRow, AuthError> {
    let email = email.trim().to_lowercase();
    validate_email(&email)?;
    if display_name.trim().is_empty() {
        return Err(AuthError::Validation("display name is required".to_string()));
    }
    if password.len() < MIN_PASSWORD_LEN {
        return Err(AuthError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    let hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|e| AuthError::Internal(anyhow::anyhow!("hash password: {e}")))?;
    // Uniqueness is enforced by the UNIQUE index, so concurrent duplicate
    // registrations resolve to EmailTaken instead of racing a pre-check.
    storage
        .create_user(&email, display_name.trim(), &hash)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AuthError::EmailTaken
            } else {
                AuthError::Internal(e)
            }
        })
}

/// Verify credentials and open a session. Returns the user and the plaintext
/// bearer token (shown to the client exactly once).
pub async fn login(
    storage: &Storage,
    email: &str,
    password: &str,
    session_ttl_hours: u32,
) -> Result<(UserRow, String), AuthError> {
    let email = email.trim().to_lowercase();
    let user = storage
        .get_user_by_email(&email)
        .await
        .map_err(AuthError::Internal)?
        .ok_or(AuthError::InvalidCredentials)?;

    let matches = bcrypt::verify(password, &user.password_hash)
        .map_err(|e| AuthError::Internal(anyhow::anyhow!("verify password: {e}")))?;
    if !matches {
        return Err(AuthError::InvalidCredentials);
    }

    let token = generate_token();
    let expires_at = (Utc::now() + Duration::hours(session_ttl_hours as i64)).to_rfc3339();
    storage
        .create_auth_session(&token_digest(&token), &user.id, &expires_at)
        .await
        .map_err(AuthError::Internal)?;
    Ok((user, token))
}

/// Resolve a `Bearer <token>` header to a user, enforcing session expiry.
pub async fn authenticate(
    storage: &Storage,
    auth_header: Option<&str>,
) -> Result<AuthedUser, AuthError> {
    let token = auth_header
        .and_then(bearer_token)
        .ok_or(AuthError::Unauthorized)?;
    let digest = token_digest(token);
    let session = storage
        .get_auth_session(&digest)
        .await
        .map_err(AuthError::Internal)?
        .ok_or(AuthError::Unauthorized)?;

    let expired = chrono::DateTime::parse_from_rfc3339(&session.expires_at)
        .map(|t| t.with_timezone(&Utc) < Utc::now())
        .unwrap_or(true);
    if expired {
        // Expired rows are also swept by the maintenance loop.
        let _ = storage.delete_auth_session(&digest).await;
        return Err(AuthError::Unauthorized);
    }

    let user = storage
        .get_user(&session.user_id)
        .await
        .map_err(AuthError::Internal)?
        .ok_or(AuthError::Unauthorized)?;
    Ok(user.into())
}

/// Revoke the session behind a bearer token. Succeeds even if already gone.
pub async fn logout(storage: &Storage, auth_header: Option<&str>) -> Result<(), AuthError> {
    let token = auth_header
        .and_then(bearer_token)
        .ok_or(AuthError::Unauthorized)?;
    storage
        .delete_auth_session(&token_digest(token))
        .await
        .map_err(AuthError::Internal)
}
