/// Authentication module
///
/// Token service (JWT issue/verify), password hashing, and the
/// authenticate/authorize decision procedure used by the middleware.

mod claims;
mod gate;
mod jwt;
mod password;

pub use claims::{Claims, TokenKind};
pub use gate::{authenticate, authorize, extract_bearer_token, AuthenticatedUser};
pub use jwt::{
    issue_access_token, issue_refresh_token, issue_token_pair, verify_access_token,
    verify_refresh_token, verify_token, TokenPair,
};
pub use password::{hash_password, verify_password, verify_password_or_dummy, HASH_COST};
