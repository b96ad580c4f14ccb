//! Token lifecycle management.
//!
//! Guarantees that upload and post-creation calls always carry a bearer
//! token that is at least five minutes away from expiry. Refreshes are
//! serialized behind a mutex so concurrent callers share one exchange.

mod manager;
mod refresher;
mod types;

pub use manager::TokenLifecycleManager;
pub use refresher::{HttpTokenRefresher, TokenRefresher};
pub use types::{Clock, SystemClock, TokenState};

use thiserror::Error;

/// Errors from the token refresh exchange.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Token refresh rejected with status {status}")]
    RefreshRejected { status: u16 },

    #[error("Token refresh response missing bearer token")]
    MissingBearer,

    #[error("HTTP error during token refresh: {0}")]
    Http(#[from] reqwest::Error),
}

impl TokenError {
    /// Refresh failures leave items queued for a later pass.
    pub fn is_retryable(&self) -> bool {
        true
    }
}
