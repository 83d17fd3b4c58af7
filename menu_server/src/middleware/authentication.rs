//! Bearer token middleware for the whole application.
//!
//! If a request carries an `Authorization: Bearer <token>` header, the token is verified and the outcome is stored in
//! the request extensions as a [`TokenStatus`]. Nothing is rejected here: requests to open routes go through whether
//! or not their token is any good. Protected routes decide what to do with the outcome in the
//! [ACL middleware](super::AclMiddlewareFactory).
use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    Error,
    HttpMessage,
};
use log::*;

use crate::auth::{TokenIssuer, TokenStatus};

pub struct AuthenticationMiddlewareFactory {
    issuer: Rc<TokenIssuer>,
}

impl AuthenticationMiddlewareFactory {
    pub fn new(issuer: TokenIssuer) -> Self {
        Self { issuer: Rc::new(issuer) }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthenticationMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AuthenticationMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthenticationMiddlewareService { issuer: Rc::clone(&self.issuer), service }))
    }
}

pub struct AuthenticationMiddlewareService<S> {
    issuer: Rc<TokenIssuer>,
    service: S,
}

impl<S, B> Service<ServiceRequest> for AuthenticationMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = S::Future;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if let Some(status) = token_status(&req, &self.issuer) {
            req.extensions_mut().insert(status);
        }
        self.service.call(req)
    }
}

fn token_status(req: &ServiceRequest, issuer: &TokenIssuer) -> Option<TokenStatus> {
    let header = req.headers().get(AUTHORIZATION)?;
    let token = match header.to_str().ok().and_then(bearer_token) {
        Some(t) => t,
        None => {
            debug!("🔑️ Authorization header on {} is not a bearer token", req.path());
            return Some(TokenStatus::Invalid("Authorization header is not a bearer token".to_string()));
        },
    };
    match issuer.verify_token(token) {
        Ok(claims) => {
            trace!("🔑️ {} ({}) is calling {}", claims.username, claims.role, req.path());
            Some(TokenStatus::Valid(claims))
        },
        Err(e) => {
            debug!("🔑️ Rejected access token on {}. {e:?}", req.path());
            Some(TokenStatus::Invalid(format!("{e:?}")))
        },
    }
}

/// Extracts the token from a `Bearer <token>` header value. The scheme is case-insensitive.
pub fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
