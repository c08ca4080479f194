//! Reference implementation of the grading service's properties and
//! submission endpoints, backed by an in-memory store.
//!
//! Used for local development (`gradectl serve`) and integration tests.

mod handlers;
pub mod middleware;
mod store;

pub use store::{GradingStore, StoredSubmission};

use axum::{middleware::from_fn_with_state, routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use middleware::{auth_middleware, AuthConfig};

/// Path prefix the service is mounted under.
pub const BASE_PATH: &str = "/services/grader";

pub fn create_router(store: GradingStore, auth: AuthConfig) -> Router {
    let api = Router::new()
        .route(
            "/lectures/{lecture_id}/assignments/{assignment_id}/submissions/{submission_id}",
            get(handlers::get_submission).put(handlers::update_submission),
        )
        .route(
            "/lectures/{lecture_id}/assignments/{assignment_id}/submissions/{submission_id}/properties",
            get(handlers::get_properties).put(handlers::update_properties),
        )
        .route_layer(from_fn_with_state(auth, auth_middleware))
        // Health stays reachable without a token
        .route("/health", get(handlers::health));

    Router::new()
        .nest(BASE_PATH, api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(store)
}
