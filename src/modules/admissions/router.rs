use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post, put},
};

use crate::state::AppState;

use super::controller::{
    add_screening_slot, get_application, get_my_application, get_next_available_slot,
    list_applicants, list_screening_slots, replace_generated_pdf, reserve_screening_slot,
    submit_application,
};

/// Room for every document slot at the per-file upload limit.
const MAX_SUBMISSION_BYTES: usize = 100 * 1024 * 1024;

pub fn init_admissions_router() -> Router<AppState> {
    Router::new()
        .route(
            "/applications",
            post(submit_application).get(list_applicants),
        )
        .route("/applications/me", get(get_my_application))
        .route("/applications/{id}", get(get_application))
        .route("/applications/{id}/pdf", put(replace_generated_pdf))
        .layer(DefaultBodyLimit::max(MAX_SUBMISSION_BYTES))
}

pub fn init_screening_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_screening_slots).post(add_screening_slot))
        .route("/next", get(get_next_available_slot))
        .route("/reserve", post(reserve_screening_slot))
}
