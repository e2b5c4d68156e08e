//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (request events, CORS,
//! compression, tracing, request deadline), and creates the axum router ready
//! for serving.

use std::time::Duration;

use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use super::handlers;
use super::middleware::record_request_event;
use super::state::AppState;

/// Deadline for a whole request.
///
/// The handler future, and any storage call it is awaiting, is dropped when
/// the deadline passes and the caller gets `500 Internal Server Error`.
fn request_deadline(request_timeout: Duration) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::INTERNAL_SERVER_ERROR, request_timeout)
}

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState, request_timeout: Duration) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let users_v1 = Router::new()
        .route("/username/{username}", get(handlers::get_user_by_username))
        .route("/email/{email}", get(handlers::get_user_by_email))
        .route(
            "/{id}",
            get(handlers::get_user)
                .put(handlers::update_user)
                .delete(handlers::delete_user),
        )
        // Relationships
        .route("/{id}/follow", put(handlers::follow))
        .route("/{id}/unfollow", put(handlers::unfollow))
        .route("/{id}/followers", get(handlers::list_followers))
        .route("/{id}/following", get(handlers::list_following))
        .route("/{id}/isFollowing", get(handlers::is_following))
        .route("/{id}/followStats", get(handlers::follow_stats))
        // Auxiliary records
        .route(
            "/{id}/profile",
            get(handlers::get_profile).put(handlers::upsert_profile),
        )
        .route(
            "/{id}/preference",
            get(handlers::get_preference).put(handlers::upsert_preference),
        );

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/user/v1", post(handlers::create_user))
        .nest("/user/v1", users_v1)
        .layer(request_deadline(request_timeout))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            record_request_event,
        ))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::RepositoryFactory;
    use crate::events::MemorySink;
    use crate::services::UserService;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    #[test]
    fn test_router_creation() {
        let service = UserService::new(RepositoryFactory::create_local());
        let state = AppState::new(service, Arc::new(MemorySink::new()));
        let _router = create_router(state, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_deadline_surfaces_as_internal_error() {
        let router = Router::new()
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    "done"
                }),
            )
            .route("/fast", get(|| async { "done" }))
            .layer(request_deadline(Duration::from_millis(20)));

        let slow = router
            .clone()
            .oneshot(Request::builder().uri("/slow").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(slow.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let fast = router
            .oneshot(Request::builder().uri("/fast").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(fast.status(), StatusCode::OK);
    }
}
