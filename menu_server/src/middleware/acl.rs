//! Access control list middleware.
//! This middleware can be placed on any route or service.
//!
//! It relies on the [authentication middleware](super::AuthenticationMiddlewareFactory) having checked the caller's
//! bearer token, and then compares the role in the token against the roles allowed on the route:
//! * no token at all: `401 Access token required`
//! * a token that did not verify (bad signature, expired, malformed): `403 Invalid or expired token`
//! * a valid token with a role that is not on the list: `403 Insufficient permissions`
//!
//! An empty role list admits any authenticated caller.

use std::{
    future::{ready, Future, Ready},
    pin::Pin,
    rc::Rc,
};

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
    HttpMessage,
};
use log::*;
use menu_engine::db_types::Role;

use crate::{
    auth::TokenStatus,
    errors::{AuthError, ServerError},
};

pub struct AclMiddlewareFactory {
    allowed_roles: Vec<Role>,
}

impl AclMiddlewareFactory {
    pub fn new(allowed_roles: &[Role]) -> Self {
        AclMiddlewareFactory { allowed_roles: allowed_roles.to_vec() }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AclMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AclMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AclMiddlewareService { allowed_roles: self.allowed_roles.clone(), service: Rc::new(service) }))
    }
}

pub struct AclMiddlewareService<S> {
    allowed_roles: Vec<Role>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AclMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let verdict = check_access(req.extensions().get::<TokenStatus>(), &self.allowed_roles);
        Box::pin(async move {
            match verdict {
                Ok(()) => service.call(req).await.map(ServiceResponse::map_into_left_body),
                Err(e) => {
                    debug!("🔑️ Access to {} denied. {e}", req.path());
                    Ok(req.error_response(ServerError::from(e)).map_into_right_body())
                },
            }
        })
    }
}

/// Decides whether a caller with the given token may use a route open to `allowed_roles`.
pub fn check_access(status: Option<&TokenStatus>, allowed_roles: &[Role]) -> Result<(), AuthError> {
    match status {
        None => Err(AuthError::MissingToken),
        Some(TokenStatus::Invalid(reason)) => Err(AuthError::InvalidToken(reason.clone())),
        Some(TokenStatus::Valid(claims)) => {
            if allowed_roles.is_empty() || allowed_roles.contains(&claims.role) {
                Ok(())
            } else {
                Err(AuthError::InsufficientPermissions)
            }
        },
    }
}
