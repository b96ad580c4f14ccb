//! Mock connectivity probe.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::connectivity::ConnectivityProbe;

/// Connectivity probe with a switchable answer.
pub struct MockConnectivityProbe {
    online: AtomicBool,
}

impl MockConnectivityProbe {
    /// Starts in the online state.
    pub fn online() -> Self {
        Self {
            online: AtomicBool::new(true),
        }
    }

    /// Starts in the offline state.
    pub fn offline() -> Self {
        Self {
            online: AtomicBool::new(false),
        }
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }
}

#[async_trait]
impl ConnectivityProbe for MockConnectivityProbe {
    async fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}
