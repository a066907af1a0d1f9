/// User Routes
///
/// `/users/current` only needs authentication; the administration routes
/// are additionally wrapped in a `RequireRole` guard in `startup`.

use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::accounts::{self, EditUserRequest};
use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::response::{ok, Data, Message};
use crate::store::Store;

/// GET /users/current
pub async fn get_current_user(
    session: web::ReqData<AuthenticatedUser>,
    store: web::Data<dyn Store>,
) -> Result<HttpResponse, AppError> {
    let profile = accounts::current_user(store.get_ref(), session.user_id).await?;

    Ok(ok(Data::new(profile)))
}

/// GET /users
pub async fn list_users(store: web::Data<dyn Store>) -> Result<HttpResponse, AppError> {
    let users = accounts::list_users(store.get_ref()).await?;

    Ok(ok(Data::new(users)))
}

/// GET /users/{user_id}
pub async fn get_user(
    path: web::Path<Uuid>,
    store: web::Data<dyn Store>,
) -> Result<HttpResponse, AppError> {
    let profile = accounts::get_user(store.get_ref(), path.into_inner()).await?;

    Ok(ok(Data::new(profile)))
}

/// PATCH /users/{user_id}
pub async fn edit_user(
    path: web::Path<Uuid>,
    form: web::Json<EditUserRequest>,
    store: web::Data<dyn Store>,
) -> Result<HttpResponse, AppError> {
    let profile = accounts::edit_user(store.get_ref(), path.into_inner(), &form).await?;

    Ok(ok(Data::with_message(profile, "User updated successfully")))
}

/// DELETE /users/{user_id}
///
/// # Errors
/// - 403: Attempt to delete the caller's own account
/// - 404: No such user
pub async fn delete_user(
    session: web::ReqData<AuthenticatedUser>,
    path: web::Path<Uuid>,
    store: web::Data<dyn Store>,
) -> Result<HttpResponse, AppError> {
    accounts::delete_user(store.get_ref(), session.user_id, path.into_inner()).await?;

    Ok(ok(Message::new("User deleted successfully")))
}
