use axum::{Router, routing::post};

use crate::state::AppState;

use super::controller::{create_announcement, list_announcements};

pub fn init_announcements_router() -> Router<AppState> {
    Router::new().route("/", post(create_announcement).get(list_announcements))
}
