/// In-process store with the same contract as `PgStore`.
///
/// One mutex guards all tables, so every trait method is atomic the way a
/// single SQL statement is.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::{fingerprint, CredentialStore, TokenLedger};
use crate::domain::{NewUser, User, UserChanges};
use crate::error::{AppError, DatabaseError};

#[derive(Default)]
struct Tables {
    /// Insertion order doubles as listing order
    users: Vec<User>,
    /// fingerprint -> owning user
    refresh_tokens: HashMap<String, Uuid>,
    /// fingerprint -> (owning user, expiration time)
    invalid_tokens: HashMap<String, (Uuid, i64)>,
}

impl Tables {
    fn email_taken(&self, email: &str, except: Option<Uuid>) -> bool {
        self.users
            .iter()
            .any(|u| u.email.eq_ignore_ascii_case(email) && Some(u.id) != except)
    }
}

#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, AppError> {
        self.tables
            .lock()
            .map_err(|_| AppError::Internal("in-memory store lock poisoned".to_string()))
    }

    pub fn refresh_token_count(&self, user_id: Uuid) -> usize {
        self.tables
            .lock()
            .map(|t| t.refresh_tokens.values().filter(|id| **id == user_id).count())
            .unwrap_or(0)
    }

    pub fn blacklist_len(&self) -> usize {
        self.tables.lock().map(|t| t.invalid_tokens.len()).unwrap_or(0)
    }
}

fn duplicate_email() -> AppError {
    AppError::Database(DatabaseError::UniqueConstraintViolation(
        "Email already in use".to_string(),
    ))
}

#[async_trait]
impl CredentialStore for InMemoryStore {
    async fn insert_user(&self, new_user: NewUser) -> Result<User, AppError> {
        let mut tables = self.tables()?;
        if tables.email_taken(&new_user.email, None) {
            return Err(duplicate_email());
        }

        let user = User {
            id: Uuid::new_v4(),
            name: new_user.name,
            email: new_user.email,
            role: new_user.role,
            password_hash: new_user.password_hash,
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.tables()?.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .tables()?
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        Ok(self.tables()?.users.clone())
    }

    async fn update_user(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>, AppError> {
        let mut tables = self.tables()?;
        if let Some(email) = &changes.email {
            if tables.email_taken(email, Some(id)) {
                return Err(duplicate_email());
            }
        }

        let Some(user) = tables.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(role) = changes.role {
            user.role = role;
        }
        Ok(Some(user.clone()))
    }

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> Result<bool, AppError> {
        let mut tables = self.tables()?;
        match tables.users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.password_hash = password_hash.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, AppError> {
        let mut tables = self.tables()?;
        let before = tables.users.len();
        tables.users.retain(|u| u.id != id);
        if tables.users.len() == before {
            return Ok(false);
        }
        tables.refresh_tokens.retain(|_, owner| *owner != id);
        tables.invalid_tokens.retain(|_, (owner, _)| *owner != id);
        Ok(true)
    }
}

#[async_trait]
impl TokenLedger for InMemoryStore {
    async fn record_refresh_token(&self, token: &str, user_id: Uuid) -> Result<(), AppError> {
        self.tables()?
            .refresh_tokens
            .insert(fingerprint(token), user_id);
        Ok(())
    }

    async fn consume_refresh_token(&self, token: &str, user_id: Uuid) -> Result<bool, AppError> {
        let mut tables = self.tables()?;
        let key = fingerprint(token);
        if tables.refresh_tokens.get(&key) == Some(&user_id) {
            tables.refresh_tokens.remove(&key);
            return Ok(true);
        }
        Ok(false)
    }

    async fn revoke_all_refresh_tokens(&self, user_id: Uuid) -> Result<u64, AppError> {
        let mut tables = self.tables()?;
        let before = tables.refresh_tokens.len();
        tables.refresh_tokens.retain(|_, owner| *owner != user_id);
        Ok((before - tables.refresh_tokens.len()) as u64)
    }

    async fn blacklist_access_token(
        &self,
        token: &str,
        user_id: Uuid,
        expiration_time: i64,
    ) -> Result<(), AppError> {
        self.tables()?
            .invalid_tokens
            .entry(fingerprint(token))
            .or_insert((user_id, expiration_time));
        Ok(())
    }

    async fn is_blacklisted(&self, token: &str) -> Result<bool, AppError> {
        Ok(self
            .tables()?
            .invalid_tokens
            .contains_key(&fingerprint(token)))
    }
}
