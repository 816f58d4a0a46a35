//! Authentication middleware protecting the publish endpoints.
//!
//! A request is authenticated either by the fronting transport filter,
//! which records the negotiated principal in a trusted header, or by
//! presenting a delegation token as a bearer credential. The resolved
//! identity is injected into request extensions for the handlers.

use actix_web::{
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    error::ErrorUnauthorized,
    http::header::AUTHORIZATION,
    Error, FromRequest, HttpMessage, HttpRequest,
};
use futures_util::future::{BoxFuture, LocalBoxFuture};
use std::{
    future::{ready, Ready},
    rc::Rc,
    sync::Arc,
    task::{Context, Poll},
};

use tlc_core::domain::entities::TokenIdentifier;
use tlc_core::errors::CoreResult;
use tlc_core::services::TokenManagerService;

/// Header the fronting transport filter uses to pass the already
/// negotiated principal. Trusted, so it must never be reachable from
/// outside that filter.
pub const PRINCIPAL_HEADER: &str = "x-timeline-principal";

/// Verification capability the middleware needs from the token layer.
pub trait TokenVerifier: Send + Sync {
    fn verify<'a>(&'a self, password: &'a str) -> BoxFuture<'a, CoreResult<TokenIdentifier>>;
}

impl TokenVerifier for TokenManagerService {
    fn verify<'a>(&'a self, password: &'a str) -> BoxFuture<'a, CoreResult<TokenIdentifier>> {
        Box::pin(self.verify_password(password))
    }
}

/// Identity resolved for an authenticated request
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Effective user the request acts as
    pub principal: String,
    /// Identifier of the delegation token used, when token-authenticated
    pub token: Option<TokenIdentifier>,
}

impl AuthContext {
    /// Context for a transport-authenticated principal
    pub fn from_principal(principal: impl Into<String>) -> Self {
        Self {
            principal: principal.into(),
            token: None,
        }
    }

    /// Context for a token-authenticated request
    pub fn from_token(identifier: TokenIdentifier) -> Self {
        Self {
            principal: identifier.owner.clone(),
            token: Some(identifier),
        }
    }
}

/// Token authentication middleware factory
pub struct TokenAuth {
    verifier: Arc<dyn TokenVerifier>,
}

impl TokenAuth {
    /// Creates the middleware around a verification capability
    pub fn new(verifier: Arc<dyn TokenVerifier>) -> Self {
        Self { verifier }
    }
}

impl<S, B> Transform<S, ServiceRequest> for TokenAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = TokenAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(TokenAuthMiddleware {
            service: Rc::new(service),
            verifier: Arc::clone(&self.verifier),
        }))
    }
}

/// Token authentication middleware service
pub struct TokenAuthMiddleware<S> {
    service: Rc<S>,
    verifier: Arc<dyn TokenVerifier>,
}

impl<S, B> Service<ServiceRequest> for TokenAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let verifier = Arc::clone(&self.verifier);

        Box::pin(async move {
            // Transport-authenticated principal wins over a bearer token
            let auth_context = if let Some(principal) = extract_principal(&req) {
                AuthContext::from_principal(principal)
            } else if let Some(token) = extract_bearer_token(&req) {
                match verifier.verify(&token).await {
                    Ok(identifier) => AuthContext::from_token(identifier),
                    Err(e) => {
                        return Err(ErrorUnauthorized(format!(
                            "Token verification failed: {}",
                            e
                        )));
                    }
                }
            } else {
                return Err(ErrorUnauthorized("Missing or invalid Authorization header"));
            };

            req.extensions_mut().insert(auth_context);

            service.call(req).await
        })
    }
}

/// Reads the negotiated principal set by the fronting transport filter
fn extract_principal(req: &ServiceRequest) -> Option<String> {
    let principal = req.headers().get(PRINCIPAL_HEADER)?.to_str().ok()?.trim();
    if principal.is_empty() {
        None
    } else {
        Some(principal.to_string())
    }
}

/// Extracts Bearer token from Authorization header
fn extract_bearer_token(req: &ServiceRequest) -> Option<String> {
    req.headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|s| s.to_string())
}

/// Extractor for required authentication
impl FromRequest for AuthContext {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        let result = req
            .extensions()
            .get::<AuthContext>()
            .cloned()
            .ok_or_else(|| ErrorUnauthorized("Authentication required"));

        ready(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_extract_bearer_token() {
        let req = TestRequest::default()
            .insert_header((AUTHORIZATION, "Bearer test_token_123"))
            .to_srv_request();
        assert_eq!(extract_bearer_token(&req), Some("test_token_123".to_string()));

        let req_no_bearer = TestRequest::default()
            .insert_header((AUTHORIZATION, "test_token_123"))
            .to_srv_request();
        assert_eq!(extract_bearer_token(&req_no_bearer), None);

        let req_no_header = TestRequest::default().to_srv_request();
        assert_eq!(extract_bearer_token(&req_no_header), None);
    }

    #[test]
    fn test_extract_principal_ignores_blank() {
        let req = TestRequest::default()
            .insert_header((PRINCIPAL_HEADER, "  "))
            .to_srv_request();
        assert_eq!(extract_principal(&req), None);

        let req = TestRequest::default()
            .insert_header((PRINCIPAL_HEADER, "foo"))
            .to_srv_request();
        assert_eq!(extract_principal(&req), Some("foo".to_string()));
    }
}
