//! Per-request event middleware.

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use super::state::AppState;
use crate::events::{RequestContext, RequestEvent};

/// Publish one [`RequestEvent`] after the inner service has produced a response.
///
/// The event is handed to the sink and the response is returned unchanged.
pub async fn record_request_event(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let user_agent = header_value(request.headers(), header::USER_AGENT.as_str());
    let client_ip = client_ip(&request);

    let response = next.run(request).await;

    let size = response
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());

    let context = RequestContext {
        request_id: Uuid::new_v4().to_string(),
        method,
        path,
        status_code: response.status().as_u16(),
        latency_ms: start.elapsed().as_millis() as u64,
        client_ip,
        user_agent,
        size,
    };
    state
        .events
        .publish(&state.routing_key, RequestEvent::processed(context));

    response
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

// First hop of X-Forwarded-For, else the peer address when the server was
// started with connect info.
fn client_ip(request: &Request) -> Option<String> {
    header_value(request.headers(), "x-forwarded-for")
        .and_then(|v| v.split(',').next().map(|ip| ip.trim().to_string()))
        .filter(|ip| !ip.is_empty())
        .or_else(|| {
            request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
}
