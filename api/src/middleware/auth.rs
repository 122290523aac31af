//! Bearer token guards.
//!
//! `JwtAuth` verifies access tokens issued by `TokenService` and injects an
//! `AuthContext` into the request. `OperatorAuth` compares a static operator
//! token and protects the ops surface. Both answer a failed check with 401
//! and the usual error body.

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    Error, FromRequest, HttpMessage, HttpRequest, ResponseError,
};
use futures_util::future::LocalBoxFuture;
use std::{
    future::{ready, Ready},
    rc::Rc,
    sync::Arc,
};
use uuid::Uuid;

use og_core::{
    domain::entities::{Claims, IdentifierType},
    errors::{DomainError, TokenError},
    services::TokenService,
};

use crate::handlers::ApiError;

/// Authenticated user injected by `JwtAuth`
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub identifier_type: IdentifierType,
    /// JWT ID for tracking
    pub jti: String,
}

impl AuthContext {
    pub fn from_claims(claims: Claims) -> Result<Self, DomainError> {
        let user_id = claims
            .user_id()
            .map_err(|_| DomainError::Token(TokenError::Invalid))?;
        Ok(Self {
            user_id,
            identifier_type: claims.identifier_type,
            jti: claims.jti,
        })
    }
}

impl FromRequest for AuthContext {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<AuthContext>()
                .cloned()
                .ok_or(ApiError(DomainError::Token(TokenError::Invalid))),
        )
    }
}

/// Token check shared by both guards
pub trait BearerCheck: Clone + 'static {
    /// Accept or reject a bearer token; on success the request may be annotated
    fn check(&self, token: &str, req: &ServiceRequest) -> Result<(), DomainError>;
}

/// Access token guard for user routes
#[derive(Clone)]
pub struct JwtAuth {
    token_service: Arc<TokenService>,
}

impl JwtAuth {
    pub fn new(token_service: Arc<TokenService>) -> Self {
        Self { token_service }
    }
}

impl BearerCheck for JwtAuth {
    fn check(&self, token: &str, req: &ServiceRequest) -> Result<(), DomainError> {
        let claims = self.token_service.verify(token)?;
        let context = AuthContext::from_claims(claims)?;
        req.extensions_mut().insert(context);
        Ok(())
    }
}

/// Static operator token guard for the ops routes
///
/// With no token configured every request is refused.
#[derive(Clone)]
pub struct OperatorAuth {
    token: Option<Arc<str>>,
}

impl OperatorAuth {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: token.filter(|t| !t.trim().is_empty()).map(Arc::from),
        }
    }
}

impl BearerCheck for OperatorAuth {
    fn check(&self, token: &str, _req: &ServiceRequest) -> Result<(), DomainError> {
        match &self.token {
            Some(expected) if constant_time_eq::constant_time_eq(expected.as_bytes(), token.as_bytes()) => Ok(()),
            _ => Err(DomainError::Token(TokenError::Invalid)),
        }
    }
}

/// Middleware factory wrapping a `BearerCheck`
pub struct BearerAuth<C> {
    check: C,
}

impl From<JwtAuth> for BearerAuth<JwtAuth> {
    fn from(check: JwtAuth) -> Self {
        Self { check }
    }
}

impl From<OperatorAuth> for BearerAuth<OperatorAuth> {
    fn from(check: OperatorAuth) -> Self {
        Self { check }
    }
}

impl<S, B, C> Transform<S, ServiceRequest> for BearerAuth<C>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
    C: BearerCheck,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = BearerAuthMiddleware<S, C>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(BearerAuthMiddleware {
            service: Rc::new(service),
            check: self.check.clone(),
        }))
    }
}

pub struct BearerAuthMiddleware<S, C> {
    service: Rc<S>,
    check: C,
}

impl<S, B, C> Service<ServiceRequest> for BearerAuthMiddleware<S, C>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
    C: BearerCheck,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let outcome = match extract_bearer_token(&req) {
            Some(token) => self.check.check(&token, &req),
            None => Err(DomainError::Token(TokenError::Invalid)),
        };

        if let Err(err) = outcome {
            tracing::warn!(
                path = %req.path(),
                event = "bearer_auth_rejected",
                "Rejected request without valid bearer token"
            );
            let response = ApiError(err).error_response();
            return Box::pin(async move { Ok(req.into_response(response).map_into_right_body()) });
        }

        let service = Rc::clone(&self.service);
        Box::pin(async move {
            let res = service.call(req).await?;
            Ok(res.map_into_left_body())
        })
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header
fn extract_bearer_token(req: &ServiceRequest) -> Option<String> {
    req.headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}
