//! Authentication error types.

use thiserror::Error;

use crate::store::StoreError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Wrong password or unknown email.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// An account already uses this email.
    #[error("email already registered")]
    EmailTaken,

    /// A required registration/login field was blank.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// Email does not look like an address.
    #[error("invalid email: {0}")]
    InvalidEmail(String),

    /// Bearer token missing, malformed, or unknown.
    #[error("invalid or missing token")]
    InvalidToken,

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,

    /// Repository error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
