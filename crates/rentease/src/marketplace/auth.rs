//! Accounts, credential checks and bearer token verification.
//!
//! Every privileged request presents a signed token which is verified on the
//! server; nothing the client stores locally is trusted on its own.

use std::sync::Arc;

use axum::http::{header, HeaderMap};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::repository::RepositoryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Member,
    Admin,
}

impl Role {
    /// Admins may do anything a member may.
    pub fn permits(self, required: Role) -> bool {
        matches!(
            (self, required),
            (Role::Admin, _) | (Role::Member, Role::Member)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    pub email: String,
    /// bcrypt hash string (`$2b$...`), salt included.
    pub password_hash: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// Account storage. Emails are stored and looked up lowercased.
pub trait AccountRepository: Send + Sync {
    fn find_by_email(&self, email: &str) -> Result<Option<Account>, RepositoryError>;
    fn insert(&self, account: NewAccount) -> Result<Account, RepositoryError>;
}

/// Token payload: `{userId, email}` plus the role and validity window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: u64,
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Option<Claims>;
}

/// HS256 token issuer and verifier.
pub struct TokenAuthority {
    secret: SecretString,
    ttl: Duration,
}

impl TokenAuthority {
    pub fn new(secret: SecretString, ttl_hours: i64) -> Self {
        Self::with_ttl(secret, Duration::hours(ttl_hours))
    }

    pub fn with_ttl(secret: SecretString, ttl: Duration) -> Self {
        Self { secret, ttl }
    }

    pub fn issue(&self, account: &Account) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: account.id.0,
            email: account.email.clone(),
            role: account.role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        let key = EncodingKey::from_secret(self.secret.expose_secret().as_bytes());
        encode(&Header::new(Algorithm::HS256), &claims, &key)
            .map_err(|error| AuthError::Signing(error.to_string()))
    }
}

impl TokenVerifier for TokenAuthority {
    fn verify(&self, token: &str) -> Option<Claims> {
        let key = DecodingKey::from_secret(self.secret.expose_secret().as_bytes());
        decode::<Claims>(token, &key, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)
            .ok()
    }
}

/// Work factor for newly stored passwords.
pub const PASSWORD_COST: u32 = 10;

/// Salted bcrypt hash of `password` at the given work factor.
pub fn hash_password(password: &str, cost: u32) -> Result<String, AuthError> {
    bcrypt::hash(password, cost).map_err(|error| AuthError::Hashing(error.to_string()))
}

/// A stored hash that cannot be parsed never matches.
fn password_matches(stored_hash: &str, password: &str) -> bool {
    bcrypt::verify(password, stored_hash).unwrap_or_else(|error| {
        warn!(%error, "stored password hash is unreadable");
        false
    })
}

/// Extract the token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    #[serde(default)]
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub token: String,
    pub email: String,
    pub role: Role,
}

const MIN_PASSWORD_LEN: usize = 8;

pub struct AuthService<A> {
    accounts: Arc<A>,
    tokens: TokenAuthority,
    cost: u32,
}

impl<A> AuthService<A>
where
    A: AccountRepository + 'static,
{
    pub fn new(accounts: Arc<A>, tokens: TokenAuthority) -> Self {
        Self {
            accounts,
            tokens,
            cost: PASSWORD_COST,
        }
    }

    /// Override the bcrypt work factor used for new registrations.
    pub fn with_cost(mut self, cost: u32) -> Self {
        self.cost = cost;
        self
    }

    /// Create a member account.
    pub fn register(&self, registration: Registration) -> Result<Account, AuthError> {
        let email = registration.email.trim().to_lowercase();
        if !email.contains('@') {
            return Err(AuthError::InvalidRegistration("a valid email is required"));
        }
        if registration.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::InvalidRegistration(
                "password must be at least 8 characters",
            ));
        }

        let password_hash = hash_password(&registration.password, self.cost)?;
        let account = self
            .accounts
            .insert(NewAccount {
                name: registration.name.trim().to_string(),
                email,
                password_hash,
                role: Role::Member,
            })
            .map_err(|error| match error {
                RepositoryError::Conflict => AuthError::EmailTaken,
                other => AuthError::Repository(other),
            })?;

        info!(account_id = account.id.0, "member account registered");
        Ok(account)
    }

    pub fn login(&self, credentials: Credentials) -> Result<Session, AuthError> {
        let email = credentials.email.trim().to_lowercase();
        let account = self
            .accounts
            .find_by_email(&email)?
            .ok_or(AuthError::InvalidCredentials)?;

        if !password_matches(&account.password_hash, &credentials.password) {
            warn!(account_id = account.id.0, "rejected login with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.tokens.issue(&account)?;
        info!(account_id = account.id.0, role = ?account.role, "session issued");
        Ok(Session {
            token,
            email: account.email,
            role: account.role,
        })
    }

    /// Verify the request's bearer token and check it grants `required`.
    pub fn authorize(&self, headers: &HeaderMap, required: Role) -> Result<Claims, AuthError> {
        let token = bearer_token(headers).ok_or(AuthError::MissingToken)?;
        let claims = self.tokens.verify(token).ok_or(AuthError::InvalidToken)?;
        if !claims.role.permits(required) {
            warn!(user_id = claims.sub, ?required, "insufficient role");
            return Err(AuthError::Forbidden);
        }
        Ok(claims)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,
    #[error("invalid or expired token")]
    InvalidToken,
    #[error("insufficient permissions")]
    Forbidden,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("{0}")]
    InvalidRegistration(&'static str),
    #[error("an account with this email already exists")]
    EmailTaken,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("token signing failed: {0}")]
    Signing(String),
    #[error("password hashing failed: {0}")]
    Hashing(String),
}
