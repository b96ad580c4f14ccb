//! Mock token refresher.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::token::{TokenError, TokenRefresher, TokenState};

/// Token refresher with scripted outcomes.
///
/// With nothing configured every refresh succeeds and mints a fresh
/// hour-long token. `set_next_state` pins the state returned by all
/// later refreshes; `fail_next` injects one error.
pub struct MockTokenRefresher {
    next_state: Arc<RwLock<Option<TokenState>>>,
    next_error: Arc<RwLock<Option<TokenError>>>,
    refresh_count: Arc<RwLock<u32>>,
}

impl Default for MockTokenRefresher {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTokenRefresher {
    pub fn new() -> Self {
        Self {
            next_state: Arc::new(RwLock::new(None)),
            next_error: Arc::new(RwLock::new(None)),
            refresh_count: Arc::new(RwLock::new(0)),
        }
    }

    /// Pin the state returned by refreshes.
    pub async fn set_next_state(&self, state: TokenState) {
        *self.next_state.write().await = Some(state);
    }

    /// Fail the next refresh with this error, once.
    pub async fn fail_next(&self, error: TokenError) {
        *self.next_error.write().await = Some(error);
    }

    /// Number of refreshes performed.
    pub async fn refresh_count(&self) -> u32 {
        *self.refresh_count.read().await
    }
}

#[async_trait]
impl TokenRefresher for MockTokenRefresher {
    async fn refresh(&self, refresh_token: &str) -> Result<TokenState, TokenError> {
        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }

        let mut count = self.refresh_count.write().await;
        *count += 1;

        if let Some(state) = self.next_state.read().await.clone() {
            return Ok(state);
        }

        Ok(TokenState {
            bearer: format!("minted-bearer-{}", *count),
            refresh_token: refresh_token.to_string(),
            user_id: "mock-user".to_string(),
            expires_at: Utc::now() + Duration::hours(1),
        })
    }
}
