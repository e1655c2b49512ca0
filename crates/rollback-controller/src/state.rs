use rollback_core::{DebounceTracker, RollbackConfig};
use std::sync::Arc;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub tracker: Arc<DebounceTracker>,
    pub config: Arc<RollbackConfig>,
}

impl AppState {
    pub fn new(tracker: Arc<DebounceTracker>, config: Arc<RollbackConfig>) -> Self {
        Self { tracker, config }
    }
}
