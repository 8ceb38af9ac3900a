//! Registration, login and bearer token resolution.

use std::sync::Arc;
use std::time::{Duration, Instant};

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use dashmap::DashMap;
use uuid::Uuid;

use super::error::AuthError;
use super::types::{AuthResponse, LoginRequest, NewUser, Principal, RegisterRequest, Role, User};
use crate::security::{Clock, SystemClock};
use crate::store::{StoreError, UserStore};

struct Session {
    principal: Principal,
    expires_at: Instant,
}

/// Issues opaque bearer tokens and resolves them back to principals.
///
/// Sessions live in process memory for `session_ttl`. Expired tokens stop
/// resolving immediately and are swept out whenever a new session opens.
pub struct IdentityService {
    users: Arc<dyn UserStore>,
    sessions: DashMap<String, Session>,
    session_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl IdentityService {
    pub fn new(users: Arc<dyn UserStore>, session_ttl: Duration) -> Self {
        Self::with_clock(users, session_ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(users: Arc<dyn UserStore>, session_ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            users,
            sessions: DashMap::new(),
            session_ttl,
            clock,
        }
    }

    /// Create a `USER` account and open a session for it.
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse, AuthError> {
        let email = parse_email(&request.email)?;
        require("password", &request.password)?;
        require("first_name", &request.first_name)?;
        require("last_name", &request.last_name)?;

        let password_hash = hash_password_blocking(request.password).await?;
        let user = self
            .users
            .insert_user(NewUser {
                email,
                first_name: request.first_name.trim().to_string(),
                last_name: request.last_name.trim().to_string(),
                password_hash,
                role: Role::User,
            })
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => AuthError::EmailTaken,
                other => AuthError::Store(other),
            })?;

        tracing::info!(user_id = user.id, "User registered");
        Ok(self.open_session(&user))
    }

    /// Check credentials and open a session.
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, AuthError> {
        let email = parse_email(&request.email)?;
        require("password", &request.password)?;

        let user = self
            .users
            .find_user_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let hash = user.password_hash.clone();
        let password = request.password;
        tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|_| AuthError::PasswordHash)??;

        tracing::debug!(user_id = user.id, "User logged in");
        Ok(self.open_session(&user))
    }

    /// Principal behind a live bearer token.
    pub fn resolve(&self, token: &str) -> Result<Principal, AuthError> {
        let now = self.clock.now();
        let principal = self
            .sessions
            .get(token)
            .filter(|session| session.expires_at > now)
            .map(|session| session.principal.clone());

        match principal {
            Some(principal) => Ok(principal),
            None => {
                self.sessions.remove_if(token, |_, session| session.expires_at <= now);
                Err(AuthError::InvalidToken)
            }
        }
    }

    /// Number of tokens held, expired ones included until the next sweep.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Drop every expired session. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.sessions.len();
        self.sessions.retain(|_, session| session.expires_at > now);
        let removed = before.saturating_sub(self.sessions.len());
        if removed > 0 {
            tracing::debug!(removed, "Expired sessions purged");
        }
        removed
    }

    fn open_session(&self, user: &User) -> AuthResponse {
        self.purge_expired();

        let token = Uuid::new_v4().to_string();
        self.sessions.insert(
            token.clone(),
            Session {
                principal: Principal {
                    user_id: user.id,
                    email: user.email.clone(),
                },
                expires_at: self.clock.now() + self.session_ttl,
            },
        );

        AuthResponse {
            token,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
        }
    }
}

fn require(field: &'static str, value: &str) -> Result<(), AuthError> {
    if value.trim().is_empty() {
        Err(AuthError::MissingField(field))
    } else {
        Ok(())
    }
}

fn parse_email(email: &str) -> Result<String, AuthError> {
    let email = email.trim();
    require("email", email)?;
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email.to_lowercase()),
        _ => Err(AuthError::InvalidEmail(email.to_string())),
    }
}

async fn hash_password_blocking(password: String) -> Result<String, AuthError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|_| AuthError::PasswordHash)?
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| AuthError::InvalidCredentials)
}
