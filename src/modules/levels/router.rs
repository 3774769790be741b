use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{initialize_levels, list_levels};

pub fn init_levels_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_levels))
        .route("/initialize", post(initialize_levels))
}
