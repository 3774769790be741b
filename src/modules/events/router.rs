use axum::{Router, routing::post};

use crate::state::AppState;

use super::controller::{create_event, list_events};

pub fn init_events_router() -> Router<AppState> {
    Router::new().route("/", post(create_event).get(list_events))
}
