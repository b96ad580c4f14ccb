//! Serialized bearer-token lifecycle.

use chrono::Duration;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use crate::metrics;

use super::refresher::TokenRefresher;
use super::types::{Clock, TokenState};
use super::TokenError;

/// Bearer tokens within this window of expiry are treated as expired.
const SAFETY_BUFFER_SECS: i64 = 5 * 60;

/// Hands out bearer tokens that are never within five minutes of expiry.
///
/// All refreshes run behind one mutex, so concurrent callers hitting an
/// expired token share a single exchange instead of racing.
pub struct TokenLifecycleManager {
    state: Mutex<TokenState>,
    refresher: Arc<dyn TokenRefresher>,
    clock: Arc<dyn Clock>,
}

impl TokenLifecycleManager {
    pub fn new(
        initial: TokenState,
        refresher: Arc<dyn TokenRefresher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            state: Mutex::new(initial),
            refresher,
            clock,
        }
    }

    /// Starts with only a refresh token; the first `bearer()` call mints one.
    pub fn from_refresh_token(
        refresh_token: impl Into<String>,
        user_id: impl Into<String>,
        refresher: Arc<dyn TokenRefresher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let epoch = chrono::DateTime::<chrono::Utc>::MIN_UTC;
        Self::new(
            TokenState {
                bearer: String::new(),
                refresh_token: refresh_token.into(),
                user_id: user_id.into(),
                expires_at: epoch,
            },
            refresher,
            clock,
        )
    }

    /// Returns a bearer token valid for at least the safety buffer.
    pub async fn bearer(&self) -> Result<String, TokenError> {
        let mut state = self.state.lock().await;
        if self.needs_refresh(&state) {
            *state = self.do_refresh(&state).await?;
        }
        Ok(state.bearer.clone())
    }

    /// Account the uploads belong to.
    pub async fn user_id(&self) -> String {
        self.state.lock().await.user_id.clone()
    }

    /// Discards the cached bearer and mints a new one.
    ///
    /// Used after a backend rejects a token that looked fresh locally.
    pub async fn force_refresh(&self) -> Result<String, TokenError> {
        let mut state = self.state.lock().await;
        *state = self.do_refresh(&state).await?;
        Ok(state.bearer.clone())
    }

    fn needs_refresh(&self, state: &TokenState) -> bool {
        if state.bearer.is_empty() {
            return true;
        }
        let buffer = Duration::seconds(SAFETY_BUFFER_SECS);
        // Seeded states carry an epoch expiry that underflows plain subtraction.
        match state.expires_at.checked_sub_signed(buffer) {
            Some(deadline) => self.clock.now() >= deadline,
            None => true,
        }
    }

    async fn do_refresh(&self, state: &TokenState) -> Result<TokenState, TokenError> {
        match self.refresher.refresh(&state.refresh_token).await {
            Ok(fresh) => {
                metrics::TOKEN_REFRESHES
                    .with_label_values(&["success"])
                    .inc();
                info!(expires_at = %fresh.expires_at, "bearer token refreshed");
                Ok(fresh)
            }
            Err(e) => {
                metrics::TOKEN_REFRESHES
                    .with_label_values(&["failed"])
                    .inc();
                Err(e)
            }
        }
    }
}
