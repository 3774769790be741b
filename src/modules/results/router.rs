use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    get_my_cgpa, get_student_cgpa, list_my_entered_results, list_my_results, list_results,
    list_student_results, list_teacher_results, record_result,
};

pub fn init_results_router() -> Router<AppState> {
    Router::new()
        .route("/", post(record_result).get(list_results))
        .route("/me", get(list_my_results))
        .route("/me/cgpa", get(get_my_cgpa))
        .route("/students/{id}", get(list_student_results))
        .route("/students/{id}/cgpa", get(get_student_cgpa))
        .route("/teachers/me", get(list_my_entered_results))
        .route("/teachers/{teacher_id}", get(list_teacher_results))
}
