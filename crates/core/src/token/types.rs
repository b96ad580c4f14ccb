//! Token state and clock seam.

use chrono::{DateTime, Utc};

/// The credential set held for the upload account.
#[derive(Debug, Clone)]
pub struct TokenState {
    /// Short-lived bearer token sent on every authenticated call.
    pub bearer: String,
    /// Long-lived token exchanged for fresh bearers.
    pub refresh_token: String,
    /// Account the uploads belong to.
    pub user_id: String,
    /// When the bearer expires.
    pub expires_at: DateTime<Utc>,
}

/// Time source seam so expiry logic can be tested with a fixed clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock implementation.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
