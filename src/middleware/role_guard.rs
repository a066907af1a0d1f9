/// Role guard middleware
///
/// Per-route authorization: the wrapped routes only admit users whose role
/// is in the configured set. Must sit inside `JwtMiddleware`, i.e. be
/// `.wrap`ped before it, so the identity is already in the extensions.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;

use crate::auth::{authorize, AuthenticatedUser};
use crate::domain::Role;
use crate::error::AppError;
use crate::store::Store;

pub struct RequireRole {
    allowed: Rc<Vec<Role>>,
    store: web::Data<dyn Store>,
}

impl RequireRole {
    pub fn new(allowed: &[Role], store: web::Data<dyn Store>) -> Self {
        Self {
            allowed: Rc::new(allowed.to_vec()),
            store,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireRole
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireRoleService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(RequireRoleService {
            service: Rc::new(service),
            allowed: self.allowed.clone(),
            store: self.store.clone(),
        }))
    }
}

pub struct RequireRoleService<S> {
    service: Rc<S>,
    allowed: Rc<Vec<Role>>,
    store: web::Data<dyn Store>,
}

impl<S, B> Service<ServiceRequest> for RequireRoleService<S>
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
        let allowed = self.allowed.clone();
        let store = self.store.clone();

        Box::pin(async move {
            let user_id = req
                .extensions()
                .get::<AuthenticatedUser>()
                .map(|authenticated| authenticated.user_id);

            let Some(user_id) = user_id else {
                // Misconfigured route: guard mounted without JwtMiddleware
                return Err(AppError::Internal(
                    "role guard reached without an authenticated user".to_string(),
                )
                .into());
            };

            if let Err(e) = authorize(user_id, &allowed, store.get_ref()).await {
                tracing::warn!(user_id = %user_id, path = %req.path(), "Role not permitted");
                return Err(e.into());
            }

            service.call(req).await
        })
    }
}
