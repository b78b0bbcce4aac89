pub mod handlers;
pub mod requests;
pub mod responses;
pub mod workflow;

use axum::routing::post;
use axum::Router;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/change-requests",
            post(handlers::create).get(handlers::list),
        )
        .route("/change-requests/{id}/approve", post(handlers::approve))
        .route("/change-requests/{id}/reject", post(handlers::reject))
        .route("/change-requests/{id}/modify", post(handlers::modify))
}
