//! Request authentication for the multi-tenant HTTP transport.
//!
//! `X-API-Key` is checked against the external authenticator service;
//! `Authorization: Bearer <jwt>` is checked locally against `JWT_SECRET`.
//! The resolved identity is stored as an [`AuthContext`] request extension.

mod authenticator;
mod jwt;

pub use authenticator::{ApiKeyAuthenticator, RemoteAuthenticator};
pub use jwt::JwtValidator;

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::config::Config;
use crate::errors::AppError;
use crate::models::AuthContext;

#[derive(Clone)]
pub struct AuthState {
    pub authenticator: Option<Arc<dyn ApiKeyAuthenticator>>,
    pub jwt: Option<JwtValidator>,
}

impl AuthState {
    /// `None` when neither an authenticator URL nor a JWT secret is configured.
    pub fn from_config(config: &Config) -> Option<Self> {
        let authenticator = config.auth_server_url.as_ref().map(|url| {
            Arc::new(RemoteAuthenticator::new(
                url.clone(),
                config.auth_server_api_key.clone(),
            )) as Arc<dyn ApiKeyAuthenticator>
        });
        let jwt = config.jwt_secret.as_deref().map(JwtValidator::new);
        if authenticator.is_none() && jwt.is_none() {
            return None;
        }
        Some(AuthState { authenticator, jwt })
    }

    async fn resolve(&self, headers: &HeaderMap) -> Result<AuthContext, AppError> {
        if let Some(api_key) = headers.get("x-api-key").and_then(|v| v.to_str().ok()) {
            let authenticator = self.authenticator.as_ref().ok_or_else(|| {
                AppError::Unauthorized("API key authentication is not configured".to_string())
            })?;
            return authenticator.authenticate(api_key).await;
        }

        if let Some(value) = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
        {
            let token = value.strip_prefix("Bearer ").ok_or_else(|| {
                AppError::Unauthorized("Authorization header must use Bearer scheme".to_string())
            })?;
            let jwt = self.jwt.as_ref().ok_or_else(|| {
                AppError::Unauthorized("Bearer authentication is not configured".to_string())
            })?;
            return jwt.validate(token);
        }

        Err(AppError::Unauthorized(
            "provide X-API-Key or Authorization header".to_string(),
        ))
    }
}

/// Rejects unauthenticated requests with 401 and injects [`AuthContext`] otherwise.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth = state.resolve(request.headers()).await?;
    // An empty owner would match rows written in single-user mode.
    if auth.owner_id().map_or(true, str::is_empty) {
        return Err(AppError::Unauthorized(
            "credential does not identify a user".to_string(),
        ));
    }
    tracing::debug!(owner = auth.owner_id(), roles = ?auth.roles, "Authenticated request");
    request.extensions_mut().insert(auth);
    Ok(next.run(request).await)
}
