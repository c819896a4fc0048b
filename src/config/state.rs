// Application state module
// Shared, read-mostly state handed to every connection

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::types::Config;

/// Application state
pub struct AppState {
    pub config: Config,

    /// Live connection counter, shared by the accept loop and shutdown drain
    pub active_connections: Arc<AtomicUsize>,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
            active_connections: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub const fn access_log_enabled(&self) -> bool {
        self.config.logging.access_log
    }

    pub fn connection_count(&self) -> usize {
        self.active_connections.load(Ordering::SeqCst)
    }
}
