//! Access tokens
//!
//! Staff log in with a username and password and receive an HS256-signed JWT that is valid for 24 hours. The token
//! carries `{id, username, role}` and is presented on every protected call as `Authorization: Bearer <token>`.
use std::future::{ready, Ready};

use actix_web::{dev::Payload, FromRequest, HttpMessage, HttpRequest};
use chrono::Duration;
use jwt_compact::{
    alg::{Hs256, Hs256Key},
    AlgorithmExt,
    Claims,
    Header,
    TimeOptions,
    Token,
    UntrustedToken,
};
use log::*;
use menu_engine::db_types::{Role, User};
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

pub const ACCESS_TOKEN_LIFETIME_HOURS: i64 = 24;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    pub id: i64,
    pub username: String,
    pub role: Role,
}

impl From<&User> for JwtClaims {
    fn from(user: &User) -> Self {
        Self { id: user.id, username: user.username.clone(), role: user.role }
    }
}

/// Handlers that take `JwtClaims` as an argument get the claims of the caller's verified access token.
///
/// The claims are placed in the request extensions by the authentication middleware. If they are missing, the caller
/// is told why: either no token was sent, or the token that was sent did not verify.
impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let extensions = req.extensions();
        let result = match extensions.get::<TokenStatus>() {
            Some(TokenStatus::Valid(claims)) => Ok(claims.clone()),
            Some(TokenStatus::Invalid(reason)) => Err(AuthError::InvalidToken(reason.clone()).into()),
            None => Err(AuthError::MissingToken.into()),
        };
        ready(result)
    }
}

/// The outcome of checking the bearer token on a request. Requests without a token carry no `TokenStatus` at all.
#[derive(Debug, Clone)]
pub enum TokenStatus {
    Valid(JwtClaims),
    Invalid(String),
}

/// Signs and verifies access tokens with the shared HMAC secret.
pub struct TokenIssuer {
    key: Hs256Key,
    lifetime: Duration,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        let key = Hs256Key::new(config.jwt_secret.reveal().as_bytes());
        Self { key, lifetime: Duration::hours(ACCESS_TOKEN_LIFETIME_HOURS) }
    }

    pub fn with_lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = lifetime;
        self
    }

    /// Issues a new access token for a user whose credentials have already been checked.
    pub fn issue_token(&self, user: &User) -> Result<String, ServerError> {
        let header = Header::empty().with_token_type("JWT");
        let claims = Claims::new(JwtClaims::from(user))
            .set_duration_and_issuance(&TimeOptions::default(), self.lifetime);
        let token = Hs256
            .token(&header, &claims, &self.key)
            .map_err(|e| ServerError::CouldNotIssueAccessToken(e.to_string()))?;
        trace!("🔑️ Issued access token for {} ({})", user.username, user.role);
        Ok(token)
    }

    /// Checks the signature and expiry of an access token and returns its claims.
    pub fn verify_token(&self, token: &str) -> Result<JwtClaims, AuthError> {
        let untrusted = UntrustedToken::new(token).map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        let token: Token<JwtClaims> =
            Hs256.validator(&self.key).validate(&untrusted).map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        let claims = token.claims();
        claims.validate_expiration(&TimeOptions::default()).map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        Ok(claims.custom.clone())
    }
}
