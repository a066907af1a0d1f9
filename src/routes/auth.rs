/// Authentication Routes
///
/// Registration, login, token refresh, logout and password change. Each
/// handler delegates to the matching workflow in `accounts` and wraps the
/// outcome in the success envelope.

use actix_web::{http::StatusCode, web, HttpResponse};

use crate::accounts::{
    self, ChangePasswordRequest, LoginRequest, RefreshRequest, RegisterRequest,
};
use crate::auth::AuthenticatedUser;
use crate::configuration::JwtSettings;
use crate::error::AppError;
use crate::response::{ok, respond, Data, Message};
use crate::store::Store;

/// POST /auth/register
///
/// # Errors
/// - 422: Validation errors (name/email/role/password)
/// - 409: Email already registered
pub async fn register(
    form: web::Json<RegisterRequest>,
    store: web::Data<dyn Store>,
) -> Result<HttpResponse, AppError> {
    let profile = accounts::register(store.get_ref(), &form).await?;

    Ok(respond(
        StatusCode::CREATED,
        Data::with_message(profile, "User registered successfully"),
    ))
}

/// POST /auth/login
///
/// Returns the user profile together with an access/refresh pair.
///
/// # Security Notes
/// - Same 401 message for "unknown email" and "wrong password"
pub async fn login(
    form: web::Json<LoginRequest>,
    store: web::Data<dyn Store>,
    jwt_config: web::Data<JwtSettings>,
) -> Result<HttpResponse, AppError> {
    let session = accounts::login(store.get_ref(), jwt_config.get_ref(), &form).await?;

    Ok(ok(Data::with_message(session, "Logged in successfully")))
}

/// POST /auth/refresh-token
///
/// Token rotation: the presented refresh token is consumed, a new pair is
/// issued. Replaying a consumed token yields 401.
pub async fn refresh(
    form: Option<web::Json<RefreshRequest>>,
    store: web::Data<dyn Store>,
    jwt_config: web::Data<JwtSettings>,
) -> Result<HttpResponse, AppError> {
    let form = form.map(web::Json::into_inner).unwrap_or_default();
    let tokens = accounts::refresh(store.get_ref(), jwt_config.get_ref(), &form).await?;

    Ok(ok(tokens))
}

/// GET /auth/logout
///
/// Revokes every refresh token of the user and blacklists the presented
/// access token. 204 without body.
pub async fn logout(
    session: web::ReqData<AuthenticatedUser>,
    store: web::Data<dyn Store>,
) -> Result<HttpResponse, AppError> {
    accounts::logout(store.get_ref(), &session).await?;

    Ok(HttpResponse::NoContent().finish())
}

/// PATCH /auth/changePassword
pub async fn change_password(
    session: web::ReqData<AuthenticatedUser>,
    form: web::Json<ChangePasswordRequest>,
    store: web::Data<dyn Store>,
) -> Result<HttpResponse, AppError> {
    accounts::change_password(store.get_ref(), session.user_id, &form).await?;

    Ok(ok(Message::new("Password updated successfully")))
}

/// GET /auth/verify-token
pub async fn verify_token(_session: web::ReqData<AuthenticatedUser>) -> HttpResponse {
    ok(Message::new("Token is valid"))
}
