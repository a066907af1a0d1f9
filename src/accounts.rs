/// Account workflows
///
/// Register, login, refresh, logout and change-password, plus the user
/// administration use cases. Every workflow takes the store and settings
/// explicitly and returns `Result<_, AppError>`; the route handlers only
/// translate the outcome into the response envelope.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{
    hash_password, issue_token_pair, verify_password, verify_password_or_dummy,
    verify_refresh_token, AuthenticatedUser, TokenPair,
};
use crate::configuration::JwtSettings;
use crate::domain::{NewUser, UserChanges, UserProfile};
use crate::error::{AppError, AuthError, DatabaseError, ValidationError};
use crate::store::Store;
use crate::validators::{is_valid_email, is_valid_name, is_valid_password, is_valid_role};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub role: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// The token is optional at the schema level: a missing token is a 401,
/// not a validation failure.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<RefreshTokenField>,
}

/// A present `refreshToken` that is not a string still counts as presented.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RefreshTokenField {
    Text(String),
    Other(serde::de::IgnoredAny),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct EditUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
}

/// Login result: the profile flattened next to both tokens
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub user: UserProfile,
    #[serde(flatten)]
    pub tokens: TokenPair,
}

const EMAIL_IN_USE: &str = "Email already in use";

fn email_conflict(err: AppError) -> AppError {
    match err {
        AppError::Database(DatabaseError::UniqueConstraintViolation(_)) => {
            AppError::Conflict(EMAIL_IN_USE.to_string())
        }
        other => other,
    }
}

pub async fn register(store: &dyn Store, form: &RegisterRequest) -> Result<UserProfile, AppError> {
    let name = is_valid_name(&form.name)?;
    let email = is_valid_email(&form.email)?;
    let role = is_valid_role(&form.role)?;
    is_valid_password("password", &form.password)?;

    // The unique index on lower(email) backs this up under races.
    if store.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict(EMAIL_IN_USE.to_string()));
    }

    let password_hash = hash_password(&form.password)?;
    let user = store
        .insert_user(NewUser {
            name,
            email,
            role,
            password_hash,
        })
        .await
        .map_err(email_conflict)?;

    tracing::info!(user_id = %user.id, role = %user.role, "User registered");
    Ok(user.into())
}

pub async fn login(
    store: &dyn Store,
    config: &JwtSettings,
    form: &LoginRequest,
) -> Result<LoginResponse, AppError> {
    let email = is_valid_email(&form.email)?;
    is_valid_password("password", &form.password)?;

    let user = store.find_user_by_email(&email).await?;
    let password_ok = verify_password_or_dummy(
        &form.password,
        user.as_ref().map(|u| u.password_hash.as_str()),
    )?;

    let user = match user {
        Some(user) if password_ok => user,
        _ => return Err(AuthError::InvalidCredentials.into()),
    };

    let tokens = issue_token_pair(user.id, config)?;
    store.record_refresh_token(&tokens.refresh_token, user.id).await?;

    tracing::info!(user_id = %user.id, "User logged in");
    Ok(LoginResponse {
        user: user.into(),
        tokens,
    })
}

/// Rotation: the presented refresh token is consumed and a new pair issued
pub async fn refresh(
    store: &dyn Store,
    config: &JwtSettings,
    form: &RefreshRequest,
) -> Result<TokenPair, AppError> {
    let token = match &form.refresh_token {
        Some(RefreshTokenField::Text(token)) if !token.trim().is_empty() => token.trim(),
        Some(RefreshTokenField::Other(_)) => return Err(AuthError::RefreshTokenInvalid.into()),
        _ => return Err(AuthError::RefreshTokenMissing.into()),
    };

    // Expired and malformed both map to RefreshTokenInvalid.
    let claims =
        verify_refresh_token(token, config).map_err(|_| AuthError::RefreshTokenInvalid)?;

    if !store.consume_refresh_token(token, claims.user_id).await? {
        tracing::warn!(user_id = %claims.user_id, "Refresh token reuse or revoked token presented");
        return Err(AuthError::RefreshTokenInvalid.into());
    }

    let tokens = issue_token_pair(claims.user_id, config)?;
    store
        .record_refresh_token(&tokens.refresh_token, claims.user_id)
        .await?;

    tracing::info!(user_id = %claims.user_id, "Token pair rotated");
    Ok(tokens)
}

pub async fn logout(store: &dyn Store, session: &AuthenticatedUser) -> Result<(), AppError> {
    let revoked = store.revoke_all_refresh_tokens(session.user_id).await?;
    store
        .blacklist_access_token(&session.token_value, session.user_id, session.token_expiry)
        .await?;

    tracing::info!(
        user_id = %session.user_id,
        revoked_refresh_tokens = revoked,
        "User logged out"
    );
    Ok(())
}

/// Existing sessions stay valid after the change.
pub async fn change_password(
    store: &dyn Store,
    user_id: Uuid,
    form: &ChangePasswordRequest,
) -> Result<(), AppError> {
    is_valid_password("currentPassword", &form.current_password)?;
    is_valid_password("newPassword", &form.new_password)?;
    if form.confirm_password != form.new_password {
        return Err(ValidationError::Mismatch(
            "confirmPassword".to_string(),
            "newPassword".to_string(),
        )
        .into());
    }

    let user = store
        .find_user_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if !verify_password(&form.current_password, &user.password_hash)? {
        return Err(AppError::Conflict("Current password is incorrect".to_string()));
    }

    let password_hash = hash_password(&form.new_password)?;
    if !store.update_password_hash(user.id, &password_hash).await? {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    tracing::info!(user_id = %user.id, "Password changed");
    Ok(())
}

pub async fn current_user(store: &dyn Store, user_id: Uuid) -> Result<UserProfile, AppError> {
    get_user(store, user_id).await
}

pub async fn list_users(store: &dyn Store) -> Result<Vec<UserProfile>, AppError> {
    Ok(store
        .list_users()
        .await?
        .into_iter()
        .map(UserProfile::from)
        .collect())
}

pub async fn get_user(store: &dyn Store, user_id: Uuid) -> Result<UserProfile, AppError> {
    store
        .find_user_by_id(user_id)
        .await?
        .map(UserProfile::from)
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

pub async fn edit_user(
    store: &dyn Store,
    user_id: Uuid,
    form: &EditUserRequest,
) -> Result<UserProfile, AppError> {
    if store.find_user_by_id(user_id).await?.is_none() {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    let changes = UserChanges {
        name: form.name.as_deref().map(is_valid_name).transpose()?,
        email: form.email.as_deref().map(is_valid_email).transpose()?,
        role: form.role.as_deref().map(is_valid_role).transpose()?,
    };

    if let Some(email) = &changes.email {
        if let Some(other) = store.find_user_by_email(email).await? {
            if other.id != user_id {
                return Err(AppError::Conflict(EMAIL_IN_USE.to_string()));
            }
        }
    }

    let updated = store
        .update_user(user_id, changes)
        .await
        .map_err(email_conflict)?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    tracing::info!(user_id = %updated.id, "User updated");
    Ok(updated.into())
}

/// Admin removal of another account; tokens go with it.
pub async fn delete_user(store: &dyn Store, actor_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
    if store.find_user_by_id(user_id).await?.is_none() {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    if actor_id == user_id {
        return Err(AppError::Forbidden("You cannot delete your own account".to_string()));
    }

    if !store.delete_user(user_id).await? {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    tracing::info!(user_id = %user_id, deleted_by = %actor_id, "User deleted");
    Ok(())
}
