/// JWT Authentication Middleware
///
/// Runs the authenticate pipeline (token present, not blacklisted, valid
/// signature and expiry) and injects the resulting `AuthenticatedUser`
/// into request extensions for handlers and the role guard.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    web, Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;

use crate::auth::authenticate;
use crate::configuration::JwtSettings;
use crate::store::Store;

/// Must wrap every route that requires a bearer access token.
pub struct JwtMiddleware {
    jwt_config: JwtSettings,
    store: web::Data<dyn Store>,
}

impl JwtMiddleware {
    pub fn new(jwt_config: JwtSettings, store: web::Data<dyn Store>) -> Self {
        Self { jwt_config, store }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(JwtMiddlewareService {
            service: Rc::new(service),
            jwt_config: Rc::new(self.jwt_config.clone()),
            store: self.store.clone(),
        }))
    }
}

pub struct JwtMiddlewareService<S> {
    service: Rc<S>,
    jwt_config: Rc<JwtSettings>,
    store: web::Data<dyn Store>,
}

impl<S, B> Service<ServiceRequest> for JwtMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let jwt_config = self.jwt_config.clone();
        let store = self.store.clone();

        Box::pin(async move {
            let header = req
                .headers()
                .get(AUTHORIZATION)
                .and_then(|h| h.to_str().ok())
                .map(str::to_string);

            let authenticated =
                match authenticate(header.as_deref(), store.get_ref(), &jwt_config).await {
                    Ok(authenticated) => authenticated,
                    Err(e) => {
                        tracing::warn!(path = %req.path(), error = %e, "Authentication rejected");
                        return Err(e.into());
                    }
                };

            tracing::debug!(user_id = %authenticated.user_id, "Access token accepted");
            req.extensions_mut().insert(authenticated);

            service.call(req).await
        })
    }
}
