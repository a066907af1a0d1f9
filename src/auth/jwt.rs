/// JWT Token Generation and Validation
///
/// Mints and verifies the signed access/refresh tokens. Verification
/// reports an explicit `TokenError` kind so callers can tell an expired
/// token from a forged or garbled one.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Serialize;
use uuid::Uuid;

use crate::auth::claims::{Claims, TokenKind};
use crate::configuration::JwtSettings;
use crate::error::{AppError, TokenError};

/// Freshly issued access/refresh pair
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

fn sign(claims: &Claims, secret: &str) -> Result<String, AppError> {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
}

/// Generate a new access token for a user
pub fn issue_access_token(user_id: Uuid, config: &JwtSettings) -> Result<String, AppError> {
    let claims = Claims::new(TokenKind::Access, user_id, config.access_token_expiry);
    sign(&claims, &config.access_secret)
}

/// Generate a new refresh token for a user, signed with the refresh secret
pub fn issue_refresh_token(user_id: Uuid, config: &JwtSettings) -> Result<String, AppError> {
    let claims = Claims::new(TokenKind::Refresh, user_id, config.refresh_token_expiry);
    sign(&claims, &config.refresh_secret)
}

pub fn issue_token_pair(user_id: Uuid, config: &JwtSettings) -> Result<TokenPair, AppError> {
    Ok(TokenPair {
        access_token: issue_access_token(user_id, config)?,
        refresh_token: issue_refresh_token(user_id, config)?,
    })
}

/// Verify signature, subject and expiry of a token
///
/// # Errors
/// - `TokenError::Expired` once the `exp` claim has passed
/// - `TokenError::Unexpected` when the key or crypto backend fails
/// - `TokenError::Malformed` for anything else (bad signature, wrong
///   secret, wrong token kind, garbage input)
pub fn verify_token(token: &str, secret: &str, kind: TokenKind) -> Result<Claims, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.sub = Some(kind.subject().to_string());
    validation.set_required_spec_claims(&["exp", "sub"]);

    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        ErrorKind::InvalidEcdsaKey
        | ErrorKind::InvalidRsaKey(_)
        | ErrorKind::RsaFailedSigning
        | ErrorKind::InvalidKeyFormat
        | ErrorKind::Crypto(_) => TokenError::Unexpected(e.to_string()),
        _ => {
            tracing::debug!("JWT validation error: {}", e);
            TokenError::Malformed
        }
    })?;

    // jsonwebtoken only rejects `exp < now`; a token is already dead at `exp`.
    if claims.is_expired() {
        return Err(TokenError::Expired);
    }

    Ok(claims)
}

pub fn verify_access_token(token: &str, config: &JwtSettings) -> Result<Claims, TokenError> {
    verify_token(token, &config.access_secret, TokenKind::Access)
}

pub fn verify_refresh_token(token: &str, config: &JwtSettings) -> Result<Claims, TokenError> {
    verify_token(token, &config.refresh_secret, TokenKind::Refresh)
}
