pub mod handlers;
pub mod requests;
pub mod responses;
pub mod rules;

use axum::routing::{get, post, put};
use axum::Router;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/time/auto-clock-out-check",
            post(handlers::auto_clock_out_check),
        )
        .route("/rules", get(handlers::list_rules))
        .route("/rules/{user_id}", put(handlers::update_rule))
}
