mod auth;
mod health_check;
mod users;

pub use auth::{change_password, login, logout, refresh, register, verify_token};
pub use health_check::health_check;
pub use users::{delete_user, edit_user, get_current_user, get_user, list_users};
