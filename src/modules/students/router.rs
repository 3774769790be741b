use axum::{
    Router,
    routing::{get, patch},
};

use crate::state::AppState;

use super::controller::{
    get_student, list_students, update_student_assignment, update_student_status,
};

pub fn init_students_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_students))
        .route("/{id}", get(get_student))
        .route("/{id}/status", patch(update_student_status))
        .route("/{id}/assignment", patch(update_student_assignment))
}
