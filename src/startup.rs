use actix_web::dev::Server;
use actix_web::{guard, web, App, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;

use crate::configuration::JwtSettings;
use crate::domain::Role;
use crate::error::{json_error_handler, path_error_handler};
use crate::logger::LoggerMiddleware;
use crate::middleware::{JwtMiddleware, RequireRole};
use crate::routes::{
    change_password, delete_user, edit_user, get_current_user, get_user, health_check,
    list_users, login, logout, refresh, register, verify_token,
};
use crate::store::Store;

const USER_READERS: &[Role] = &[Role::Admin, Role::Moderator];
const USER_ADMINS: &[Role] = &[Role::Admin];

pub fn run(
    listener: TcpListener,
    store: Arc<dyn Store>,
    jwt_config: JwtSettings,
) -> Result<Server, std::io::Error> {
    let store: web::Data<dyn Store> = web::Data::from(store);
    let jwt_config_data = web::Data::new(jwt_config.clone());

    let server = HttpServer::new(move || {
        let authenticated = || JwtMiddleware::new(jwt_config.clone(), store.clone());
        let requires = |roles: &[Role]| RequireRole::new(roles, store.clone());

        App::new()
            .wrap(LoggerMiddleware)

            // Shared state
            .app_data(store.clone())
            .app_data(jwt_config_data.clone())
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .app_data(web::PathConfig::default().error_handler(path_error_handler))

            .route("/health_check", web::get().to(health_check))

            .service(
                web::scope("/auth")
                    // Public
                    .route("/register", web::post().to(register))
                    .route("/login", web::post().to(login))
                    .route("/refresh-token", web::post().to(refresh))
                    // Bearer access token required
                    .service(
                        web::resource("/logout")
                            .wrap(authenticated())
                            .route(web::get().to(logout)),
                    )
                    .service(
                        web::resource("/changePassword")
                            .wrap(authenticated())
                            .route(web::patch().to(change_password)),
                    )
                    .service(
                        web::resource("/verify-token")
                            .wrap(authenticated())
                            .route(web::get().to(verify_token)),
                    ),
            )
            .service(
                web::scope("/users")
                    .wrap(authenticated())
                    .route("/current", web::get().to(get_current_user))
                    .service(
                        web::resource("")
                            .wrap(requires(USER_READERS))
                            .route(web::get().to(list_users)),
                    )
                    .service(
                        web::resource("/{user_id}")
                            .guard(guard::Get())
                            .wrap(requires(USER_READERS))
                            .route(web::get().to(get_user)),
                    )
                    .service(
                        web::resource("/{user_id}")
                            .wrap(requires(USER_ADMINS))
                            .route(web::patch().to(edit_user))
                            .route(web::delete().to(delete_user)),
                    ),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
