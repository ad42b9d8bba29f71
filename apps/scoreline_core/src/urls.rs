use axum::{routing::get, Router};

use crate::views::{health::health, result_lookup::result};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/result", get(result))
}
