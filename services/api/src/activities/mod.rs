pub mod handlers;
pub mod requests;
pub mod responses;

use axum::routing::{get, post};
use axum::Router;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/activities", get(handlers::list_activities))
        .route("/sync", post(handlers::run_sync))
        .route("/sync/status", get(handlers::sync_status))
}
