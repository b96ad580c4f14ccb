use std::sync::Arc;

use postpipe_core::{Config, NodeSelector, QueueStore, SanitizedConfig, UploadProcessor};

/// Shared application state
pub struct AppState {
    config: Config,
    store: Arc<dyn QueueStore>,
    processor: Arc<UploadProcessor>,
    selector: Arc<NodeSelector>,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn QueueStore>,
        processor: Arc<UploadProcessor>,
        selector: Arc<NodeSelector>,
    ) -> Self {
        Self {
            config,
            store,
            processor,
            selector,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn store(&self) -> &dyn QueueStore {
        self.store.as_ref()
    }

    pub fn processor(&self) -> &UploadProcessor {
        self.processor.as_ref()
    }

    pub fn selector(&self) -> &NodeSelector {
        self.selector.as_ref()
    }
}
