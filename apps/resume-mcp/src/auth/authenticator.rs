use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::warn;

use crate::errors::AppError;
use crate::models::AuthContext;

/// Resolves a caller-supplied API key to an identity.
#[async_trait]
pub trait ApiKeyAuthenticator: Send + Sync {
    async fn authenticate(&self, api_key: &str) -> Result<AuthContext, AppError>;
}

#[derive(Debug, Deserialize)]
struct RemoteUser {
    id: String,
    #[serde(default)]
    role: Option<String>,
}

/// Validates keys against `GET {base_url}/auth/apikey/user`.
#[derive(Clone)]
pub struct RemoteAuthenticator {
    client: Client,
    base_url: String,
    server_key: Option<String>,
}

impl RemoteAuthenticator {
    pub fn new(base_url: impl Into<String>, server_key: Option<String>) -> Self {
        RemoteAuthenticator {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            server_key,
        }
    }
}

#[async_trait]
impl ApiKeyAuthenticator for RemoteAuthenticator {
    async fn authenticate(&self, api_key: &str) -> Result<AuthContext, AppError> {
        let mut request = self
            .client
            .get(format!("{}/auth/apikey/user", self.base_url))
            .header("x-api-key", api_key);
        if let Some(key) = &self.server_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("auth server unreachable: {e}")))?;

        match response.status() {
            StatusCode::OK => {
                let user: RemoteUser = response.json().await.map_err(|e| {
                    AppError::Internal(anyhow::anyhow!("invalid auth server response: {e}"))
                })?;
                Ok(AuthContext::user(user.id, user.role.into_iter().collect()))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => {
                Err(AppError::Unauthorized("API key rejected".to_string()))
            }
            status => {
                warn!(%status, "Auth server returned unexpected status");
                Err(AppError::Internal(anyhow::anyhow!(
                    "auth server returned {status}"
                )))
            }
        }
    }
}
