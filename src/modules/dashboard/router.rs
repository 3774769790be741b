use axum::{Router, routing::get};

use crate::state::AppState;

use super::controller::{get_student_stats, get_teacher_stats};

pub fn init_dashboard_router() -> Router<AppState> {
    Router::new()
        .route("/students", get(get_student_stats))
        .route("/teachers", get(get_teacher_stats))
}
