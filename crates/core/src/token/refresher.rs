//! Refresh-token exchange against the auth endpoint.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::config::AuthConfig;

use super::types::TokenState;
use super::TokenError;

/// Exchanges a refresh token for a fresh bearer token.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self, refresh_token: &str) -> Result<TokenState, TokenError>;
}

/// HTTP implementation of the refresh-token exchange.
pub struct HttpTokenRefresher {
    client: reqwest::Client,
    config: AuthConfig,
}

#[derive(Deserialize)]
struct RefreshResponse {
    #[serde(alias = "idToken", alias = "access_token")]
    id_token: String,
    #[serde(default, alias = "refreshToken")]
    refresh_token: Option<String>,
    #[serde(default, alias = "expiresIn")]
    expires_in: Option<String>,
    #[serde(default, alias = "userId")]
    user_id: Option<String>,
}

impl HttpTokenRefresher {
    pub fn new(config: AuthConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs as u64))
            .build()
            .unwrap_or_default();
        Self { client, config }
    }
}

#[async_trait]
impl TokenRefresher for HttpTokenRefresher {
    async fn refresh(&self, refresh_token: &str) -> Result<TokenState, TokenError> {
        debug!(url = %self.config.refresh_url, "refreshing bearer token");

        let response = self
            .client
            .post(&self.config.refresh_url)
            .json(&json!({
                "grantType": "refresh_token",
                "refreshToken": refresh_token,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "token refresh rejected");
            return Err(TokenError::RefreshRejected {
                status: status.as_u16(),
            });
        }

        let body: RefreshResponse = response.json().await?;
        if body.id_token.is_empty() {
            return Err(TokenError::MissingBearer);
        }

        let expires_in_secs = body
            .expires_in
            .as_deref()
            .and_then(|s| s.parse::<i64>().ok())
            .unwrap_or(3600);

        Ok(TokenState {
            bearer: body.id_token,
            refresh_token: body
                .refresh_token
                .unwrap_or_else(|| refresh_token.to_string()),
            user_id: body
                .user_id
                .unwrap_or_else(|| self.config.user_id.clone()),
            expires_at: Utc::now() + Duration::seconds(expires_in_secs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_response_snake_case() {
        let json = r#"{
            "access_token": "bearer-1",
            "refresh_token": "rt-2",
            "expires_in": "3600",
            "user_id": "u1"
        }"#;
        let parsed: RefreshResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.id_token, "bearer-1");
        assert_eq!(parsed.refresh_token.as_deref(), Some("rt-2"));
        assert_eq!(parsed.expires_in.as_deref(), Some("3600"));
        assert_eq!(parsed.user_id.as_deref(), Some("u1"));
    }

    #[test]
    fn test_refresh_response_camel_case() {
        let json = r#"{
            "idToken": "bearer-2",
            "refreshToken": "rt-3"
        }"#;
        let parsed: RefreshResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.id_token, "bearer-2");
        assert_eq!(parsed.refresh_token.as_deref(), Some("rt-3"));
        assert!(parsed.expires_in.is_none());
    }
}
