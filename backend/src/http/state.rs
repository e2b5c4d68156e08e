//! Application state for the HTTP server.

use std::sync::Arc;

use crate::events::{EventSink, DEFAULT_ROUTING_KEY};
use crate::services::UserService;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Business logic over the configured repositories
    pub service: UserService,
    /// Destination of per-request events
    pub events: Arc<dyn EventSink>,
    /// Routing key attached to each published event
    pub routing_key: Arc<str>,
}

impl AppState {
    /// Create a new application state publishing under the default routing key.
    pub fn new(service: UserService, events: Arc<dyn EventSink>) -> Self {
        Self {
            service,
            events,
            routing_key: Arc::from(DEFAULT_ROUTING_KEY),
        }
    }

    pub fn with_routing_key(mut self, routing_key: impl Into<String>) -> Self {
        self.routing_key = Arc::from(routing_key.into());
        self
    }
}
