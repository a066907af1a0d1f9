/// Persistence layer
///
/// The workflows only see the `CredentialStore` and `TokenLedger` traits.
/// `PgStore` backs them with Postgres; `InMemoryStore` is a drop-in used by
/// the test suites.
///
/// Token strings never hit the store in plaintext: the ledger keys rows by
/// the SHA-256 fingerprint of the token.

mod memory;
mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::domain::{NewUser, User, UserChanges};
use crate::error::AppError;

/// User records
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Fails with `DatabaseError::UniqueConstraintViolation` when the email is taken
    async fn insert_user(&self, new_user: NewUser) -> Result<User, AppError>;

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    /// `email` is expected already lowercased
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn list_users(&self) -> Result<Vec<User>, AppError>;

    /// Keyed update. Returns `None` when no user has this id.
    async fn update_user(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>, AppError>;

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> Result<bool, AppError>;

    /// Deletes the user together with its refresh tokens and blacklist rows
    async fn delete_user(&self, id: Uuid) -> Result<bool, AppError>;
}

/// Issued refresh tokens and revoked access tokens
#[async_trait]
pub trait TokenLedger: Send + Sync {
    async fn record_refresh_token(&self, token: &str, user_id: Uuid) -> Result<(), AppError>;

    /// Atomically locate-and-delete the row matching both token and user.
    /// Of two concurrent callers with the same token at most one sees `true`.
    async fn consume_refresh_token(&self, token: &str, user_id: Uuid) -> Result<bool, AppError>;

    /// Conditional bulk delete; returns how many rows went away
    async fn revoke_all_refresh_tokens(&self, user_id: Uuid) -> Result<u64, AppError>;

    async fn blacklist_access_token(
        &self,
        token: &str,
        user_id: Uuid,
        expiration_time: i64,
    ) -> Result<(), AppError>;

    async fn is_blacklisted(&self, token: &str) -> Result<bool, AppError>;
}

/// Everything the API needs from persistence
pub trait Store: CredentialStore + TokenLedger {}

impl<T: CredentialStore + TokenLedger> Store for T {}

/// SHA-256 hex digest used as the ledger key for a token
pub fn fingerprint(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}
