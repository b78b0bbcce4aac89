pub mod handlers;
pub mod requests;
pub mod responses;

use axum::routing::{get, post};
use axum::Router;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/time/clock-in", post(handlers::clock_in))
        .route("/time/clock-out", post(handlers::clock_out))
        .route("/time/breaks/start", post(handlers::start_break))
        .route("/time/breaks/end", post(handlers::end_break))
        .route("/time/entries", get(handlers::list_entries))
        .route("/time/current", get(handlers::current_entry))
}
