//! Structured request events and the sinks they are shipped to.
//!
//! One [`RequestEvent`] is published per completed HTTP request. Publishing is
//! fire-and-forget: [`EventSink::publish`] never blocks and never fails, so the
//! outcome of a request cannot depend on the event pipeline.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Value of [`RequestEvent::source`] for every event this service emits.
pub const EVENT_SOURCE: &str = "user-service";

/// Default routing key for request events.
pub const DEFAULT_ROUTING_KEY: &str = "user.request";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventLevel {
    Info,
    Warning,
    Error,
}

impl EventLevel {
    /// Level matching an HTTP status: 5xx is an error, 4xx a warning.
    pub fn for_status(status: u16) -> Self {
        match status {
            500..=u16::MAX => EventLevel::Error,
            400..=499 => EventLevel::Warning,
            _ => EventLevel::Info,
        }
    }
}

/// Caller and outcome metadata attached to a request event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    pub request_id: String,
    pub method: String,
    pub path: String,
    pub status_code: u16,
    pub latency_ms: u64,
    pub client_ip: Option<String>,
    pub user_agent: Option<String>,
    /// Response body size in bytes, when known from `Content-Length`.
    pub size: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestEvent {
    pub timestamp: DateTime<Utc>,
    pub level: EventLevel,
    pub source: String,
    pub component: String,
    pub message: String,
    pub context: RequestContext,
}

impl RequestEvent {
    /// Event for a request handled by the HTTP controller.
    pub fn processed(context: RequestContext) -> Self {
        Self {
            timestamp: Utc::now(),
            level: EventLevel::for_status(context.status_code),
            source: EVENT_SOURCE.to_string(),
            component: "controller".to_string(),
            message: "processed request".to_string(),
            context,
        }
    }
}

/// Destination for request events.
pub trait EventSink: Send + Sync {
    /// Hand off `event`. Must return promptly and swallow its own failures.
    fn publish(&self, routing_key: &str, event: RequestEvent);
}

/// Writes each event as a JSON line on the `request_events` tracing target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn publish(&self, routing_key: &str, event: RequestEvent) {
        match serde_json::to_string(&event) {
            Ok(json) => tracing::info!(target: "request_events", routing_key, "{}", json),
            Err(e) => tracing::warn!(target: "request_events", "failed to encode event: {}", e),
        }
    }
}

/// Keeps every published event in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    events: Arc<Mutex<Vec<(String, RequestEvent)>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Published `(routing_key, event)` pairs in publish order.
    pub fn events(&self) -> Vec<(String, RequestEvent)> {
        self.events.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl EventSink for MemorySink {
    fn publish(&self, routing_key: &str, event: RequestEvent) {
        self.events.lock().push((routing_key.to_string(), event));
    }
}

/// Queues events on an unbounded channel drained by a background task.
///
/// The task forwards to a downstream sink, so a slow downstream never holds
/// up the request that produced the event.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<(String, RequestEvent)>,
}

impl ChannelSink {
    /// Spawn the forwarding task and return the sink plus the task handle.
    ///
    /// The task ends once every clone of the sink has been dropped and the
    /// queue is drained. Must be called within a tokio runtime.
    pub fn start(downstream: Arc<dyn EventSink>) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<(String, RequestEvent)>();

        let handle = tokio::spawn(async move {
            while let Some((routing_key, event)) = rx.recv().await {
                downstream.publish(&routing_key, event);
            }
            tracing::debug!("request event channel closed");
        });

        (Self { tx }, handle)
    }
}

impl EventSink for ChannelSink {
    fn publish(&self, routing_key: &str, event: RequestEvent) {
        if self.tx.send((routing_key.to_string(), event)).is_err() {
            tracing::warn!("request event worker stopped; dropping event");
        }
    }
}
