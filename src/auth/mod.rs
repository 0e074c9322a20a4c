/*!
 * # Authentication and Authorization Module
 *
 * Bearer JWTs identify the acting user, their company and their role. The
 * permission claims are parsed once into a [`PermissionMatrix`]; routes then
 * declare the capability they need with [`AuthRouterExt`].
 */

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

mod permissions;

pub use permissions::*;

/// Claim structure for JWT tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,              // Subject (user ID)
    pub company_id: String,       // Company the session acts for
    pub role: Role,               // Employee, supplier or customer
    pub permissions: Vec<String>, // e.g. "view_purchasing"
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
    pub nbf: i64,
    pub iss: String,
    pub aud: String,
}

/// Authenticated caller resolved from the bearer token
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub company_id: Uuid,
    pub role: Role,
    pub permissions: PermissionMatrix,
    pub token_id: String,
}

/// The caller's identity plus their capability table
pub type PermissionContext = AuthUser;

impl AuthUser {
    pub fn new(user_id: Uuid, company_id: Uuid, role: Role, permissions: PermissionMatrix) -> Self {
        Self {
            user_id,
            company_id,
            role,
            permissions,
            token_id: Uuid::new_v4().to_string(),
        }
    }

    pub fn can(&self, action: Action, module: Module) -> bool {
        self.permissions.can(action, module)
    }

    pub fn is_employee(&self) -> bool {
        self.role.is_employee()
    }

    pub fn belongs_to_company(&self, company_id: Uuid) -> bool {
        self.company_id == company_id
    }
}

/// Authentication configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_audience: String,
    pub jwt_issuer: String,
    pub access_token_expiration: Duration,
}

impl AuthConfig {
    pub fn new(jwt_secret: String, jwt_audience: String, jwt_issuer: String) -> Self {
        Self {
            jwt_secret,
            jwt_audience,
            jwt_issuer,
            access_token_expiration: Duration::from_secs(60 * 60),
        }
    }
}

impl From<&crate::config::AppConfig> for AuthConfig {
    fn from(cfg: &crate::config::AppConfig) -> Self {
        Self::new(
            cfg.jwt_secret.clone(),
            cfg.auth_audience.clone(),
            cfg.auth_issuer.clone(),
        )
    }
}

/// Issues and validates session tokens
#[derive(Debug, Clone)]
pub struct AuthService {
    pub config: AuthConfig,
}

impl AuthService {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    /// Signs a token for `user`
    pub fn issue_token(&self, user: &AuthUser) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = now
            + ChronoDuration::from_std(self.config.access_token_expiration)
                .map_err(|_| AuthError::InternalError("Invalid token duration".to_string()))?;

        let claims = Claims {
            sub: user.user_id.to_string(),
            company_id: user.company_id.to_string(),
            role: user.role,
            permissions: user.permissions.to_claims(),
            jti: user.token_id.clone(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            nbf: now.timestamp(),
            iss: self.config.jwt_issuer.clone(),
            aud: self.config.jwt_audience.clone(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenCreation(e.to_string()))
    }

    /// Validate a JWT token and extract the claims
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[self.config.jwt_audience.as_str()]);
        validation.set_issuer(&[self.config.jwt_issuer.as_str()]);

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })?;

        Ok(data.claims)
    }

    /// Resolves the caller from validated claims
    pub fn authenticate(&self, token: &str) -> Result<AuthUser, AuthError> {
        let claims = self.validate_token(token)?;
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?;
        let company_id = Uuid::parse_str(&claims.company_id).map_err(|_| AuthError::InvalidToken)?;

        Ok(AuthUser {
            user_id,
            company_id,
            role: claims.role,
            permissions: PermissionMatrix::from_claims(&claims.permissions),
            token_id: claims.jti,
        })
    }
}

/// Authentication error types
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing authentication")]
    MissingAuth,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Token creation failed: {0}")]
    TokenCreation(String),

    #[error("Insufficient permissions")]
    InsufficientPermissions(Capability),

    #[error("Role not permitted")]
    RoleNotPermitted(Role),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_code, error_message): (StatusCode, &str, String) = match &self {
            Self::MissingAuth => (
                StatusCode::UNAUTHORIZED,
                "AUTH_MISSING",
                "Authentication required".to_string(),
            ),
            Self::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "AUTH_INVALID_TOKEN",
                "Invalid authentication token".to_string(),
            ),
            Self::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                "AUTH_TOKEN_EXPIRED",
                "Token has expired".to_string(),
            ),
            Self::TokenCreation(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "AUTH_TOKEN_CREATION_FAILED",
                msg.clone(),
            ),
            Self::InsufficientPermissions(cap) => (
                StatusCode::FORBIDDEN,
                "AUTH_INSUFFICIENT_PERMISSIONS",
                format!("Missing permission {}", cap),
            ),
            Self::RoleNotPermitted(role) => (
                StatusCode::FORBIDDEN,
                "AUTH_ROLE_NOT_PERMITTED",
                format!("Requires the {} role", role),
            ),
            Self::InternalError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "AUTH_INTERNAL_ERROR",
                msg.clone(),
            ),
        };

        let body = Json(serde_json::json!({
            "error": {
                "code": error_code,
                "message": error_message,
            },
            "request_id": crate::tracing::current_request_id().map(|rid| rid.0),
        }));

        (status, body).into_response()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AuthError::MissingAuth)
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Authentication middleware that validates the bearer token
pub async fn auth_middleware(
    State(auth_service): State<Arc<AuthService>>,
    mut request: Request,
    next: Next,
) -> Response {
    let user = match bearer_token(request.headers()) {
        Some(token) => auth_service.authenticate(token),
        None => Err(AuthError::MissingAuth),
    };

    match user {
        Ok(user) => {
            debug!(user_id = %user.user_id, company_id = %user.company_id, "authenticated");
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

/// Rejects callers that lack the route's capability
pub async fn capability_middleware(
    State(required): State<Capability>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or(AuthError::MissingAuth)?;

    if !user.permissions.allows(required) {
        return Err(AuthError::InsufficientPermissions(required));
    }

    Ok(next.run(request).await)
}

/// Rejects callers whose role differs from the route's
pub async fn role_middleware(
    State(required): State<Role>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or(AuthError::MissingAuth)?;

    if user.role != required {
        return Err(AuthError::RoleNotPermitted(required));
    }

    Ok(next.run(request).await)
}

/// Extension methods for Router to add auth middleware
///
/// `with_capability` and `with_role` read the [`AuthUser`] inserted by
/// `with_auth`, so `with_auth` must wrap them from the outside.
pub trait AuthRouterExt {
    fn with_auth(self, auth: Arc<AuthService>) -> Self;
    fn with_capability(self, action: Action, module: Module) -> Self;
    fn with_role(self, role: Role) -> Self;
}

impl<S> AuthRouterExt for axum::Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_auth(self, auth: Arc<AuthService>) -> Self {
        self.layer(axum::middleware::from_fn_with_state(auth, auth_middleware))
    }

    fn with_capability(self, action: Action, module: Module) -> Self {
        self.layer(axum::middleware::from_fn_with_state(
            Capability::new(action, module),
            capability_middleware,
        ))
    }

    fn with_role(self, role: Role) -> Self {
        self.layer(axum::middleware::from_fn_with_state(role, role_middleware))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use axum::{body::Body, routing::get, Router};
    use tower::ServiceExt;

    const SECRET: &str = "test-secret-with-enough-entropy-0123456789abcdefghijklmnopqrstuvwxyz";

    fn service() -> Arc<AuthService> {
        Arc::new(AuthService::new(AuthConfig::new(
            SECRET.into(),
            "erp-web".into(),
            "erp-api".into(),
        )))
    }

    fn employee(matrix: PermissionMatrix) -> AuthUser {
        AuthUser::new(Uuid::new_v4(), Uuid::new_v4(), Role::Employee, matrix)
    }

    #[test]
    fn issued_token_authenticates() {
        let auth = service();
        let user = employee(PermissionMatrix::empty().with(Action::View, Module::Purchasing));
        let token = auth.issue_token(&user).unwrap();

        let resolved = auth.authenticate(&token).unwrap();
        assert_eq!(resolved.user_id, user.user_id);
        assert_eq!(resolved.company_id, user.company_id);
        assert!(resolved.can(Action::View, Module::Purchasing));
        assert!(!resolved.can(Action::Update, Module::Purchasing));
    }

    #[test]
    fn foreign_audience_is_rejected() {
        let other = AuthService::new(AuthConfig::new(
            SECRET.into(),
            "someone-else".into(),
            "erp-api".into(),
        ));
        let token = other.issue_token(&employee(PermissionMatrix::full())).unwrap();
        assert_matches!(service().authenticate(&token), Err(AuthError::InvalidToken));
    }

    fn guarded(auth: Arc<AuthService>) -> Router {
        Router::new()
            .route("/", get(|user: AuthUser| async move { user.user_id.to_string() }))
            .with_capability(Action::Update, Module::Production)
            .with_role(Role::Employee)
            .with_auth(auth)
    }

    async fn call(router: Router, token: Option<String>) -> StatusCode {
        let mut req = Request::builder().uri("/");
        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        router
            .oneshot(req.body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn missing_token_is_unauthorized() {
        assert_eq!(call(guarded(service()), None).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn missing_capability_is_forbidden() {
        let auth = service();
        let token = auth
            .issue_token(&employee(PermissionMatrix::empty().with(Action::View, Module::Production)))
            .unwrap();
        assert_eq!(call(guarded(auth), Some(token)).await, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn wrong_role_is_forbidden() {
        let auth = service();
        let supplier = AuthUser::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Role::Supplier,
            PermissionMatrix::full(),
        );
        let token = auth.issue_token(&supplier).unwrap();
        assert_eq!(call(guarded(auth), Some(token)).await, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn granted_capability_passes() {
        let auth = service();
        let token = auth
            .issue_token(&employee(PermissionMatrix::empty().with(Action::Update, Module::Production)))
            .unwrap();
        assert_eq!(call(guarded(auth), Some(token)).await, StatusCode::OK);
    }
}
