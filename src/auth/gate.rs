/// Authentication / authorization decision procedure
///
/// `authenticate` and `authorize` are plain async functions over a store so
/// the HTTP middleware stays a thin adapter and the pipeline can be tested
/// without a server.

use uuid::Uuid;

use crate::auth::jwt::verify_access_token;
use crate::configuration::JwtSettings;
use crate::domain::{Role, User};
use crate::error::{AppError, AuthError, TokenError};
use crate::store::Store;

/// What a successful authentication attaches to the request
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    /// The raw access token as presented; logout blacklists it
    pub token_value: String,
    /// `exp` claim of the presented token
    pub token_expiry: i64,
}

/// Pulls the token out of an `Authorization` header value.
/// Accepts both `Bearer <token>` and a bare token.
pub fn extract_bearer_token(header: Option<&str>) -> Option<&str> {
    let value = header?.trim();
    let token = match value.split_once(' ') {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
        _ => value,
    };

    if token.is_empty() || token.eq_ignore_ascii_case("bearer") {
        None
    } else {
        Some(token)
    }
}

/// present? -> blacklisted? -> signature valid and not expired?
pub async fn authenticate(
    header: Option<&str>,
    store: &dyn Store,
    config: &JwtSettings,
) -> Result<AuthenticatedUser, AppError> {
    let token = extract_bearer_token(header).ok_or(AuthError::MissingToken)?;

    if store.is_blacklisted(token).await? {
        return Err(AuthError::AccessTokenInvalid.into());
    }

    let claims = verify_access_token(token, config).map_err(|e| -> AppError {
        match e {
            TokenError::Expired => AuthError::AccessTokenExpired.into(),
            TokenError::Malformed => AuthError::AccessTokenInvalid.into(),
            TokenError::Unexpected(msg) => AppError::Internal(msg),
        }
    })?;

    Ok(AuthenticatedUser {
        user_id: claims.user_id,
        token_value: token.to_string(),
        token_expiry: claims.exp,
    })
}

/// Loads the user and checks role membership. A user deleted after the
/// token was issued is treated like a user with the wrong role.
pub async fn authorize(
    user_id: Uuid,
    allowed_roles: &[Role],
    store: &dyn Store,
) -> Result<User, AppError> {
    match store.find_user_by_id(user_id).await? {
        Some(user) if allowed_roles.contains(&user.role) => Ok(user),
        _ => Err(AppError::Forbidden("Access denied".to_string())),
    }
}
