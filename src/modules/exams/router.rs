use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    create_exam, delete_exam, get_exam, list_exams, list_my_exams, list_teacher_exams,
    update_exam,
};

pub fn init_exams_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_exam).get(list_exams))
        .route("/me", get(list_my_exams))
        .route("/teachers/{teacher_id}", get(list_teacher_exams))
        .route(
            "/{id}",
            get(get_exam).patch(update_exam).delete(delete_exam),
        )
}
