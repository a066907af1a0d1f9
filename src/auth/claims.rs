/// JWT Claims structure
///
/// Payload shared by access and refresh tokens. The `sub` claim names the
/// token kind rather than the user, mirroring the wire format clients
/// already depend on; the user lives in `userId`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which of the two token families a claim set belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    /// Value carried in the `sub` claim
    pub fn subject(&self) -> &'static str {
        match self {
            TokenKind::Access => "accessApi",
            TokenKind::Refresh => "refreshToken",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    /// Token kind (`accessApi` or `refreshToken`)
    pub sub: String,
    pub user_id: Uuid,
    /// Unique token id; two tokens minted in the same second still differ
    pub jti: Uuid,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    pub fn new(kind: TokenKind, user_id: Uuid, expiry_seconds: i64) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: kind.subject().to_string(),
            user_id,
            jti: Uuid::new_v4(),
            iat: now,
            exp: now + expiry_seconds,
        }
    }

    pub fn is_expired(&self) -> bool {
        chrono::Utc::now().timestamp() >= self.exp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_creation() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(TokenKind::Access, user_id, 3600);

        assert_eq!(claims.sub, "accessApi");
        assert_eq!(claims.user_id, user_id);
        assert_eq!(claims.exp - claims.iat, 3600);
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_each_claim_set_gets_its_own_jti() {
        let user_id = Uuid::new_v4();
        let a = Claims::new(TokenKind::Refresh, user_id, 60);
        let b = Claims::new(TokenKind::Refresh, user_id, 60);
        assert_ne!(a.jti, b.jti);
    }

    #[test]
    fn test_claims_wire_names() {
        let claims = Claims::new(TokenKind::Refresh, Uuid::new_v4(), 60);
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["sub"], "refreshToken");
        assert!(json.get("userId").is_some());
    }

    #[test]
    fn test_zero_expiry_is_expired() {
        let claims = Claims::new(TokenKind::Access, Uuid::new_v4(), 0);
        assert!(claims.is_expired());
    }
}
