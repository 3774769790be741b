use axum::{
    Router,
    routing::{get, post},
};

use crate::modules::courses::controller::list_teacher_courses;
use crate::state::AppState;

use super::controller::{
    create_teacher, delete_teacher, get_current_teacher, get_teacher, get_teacher_by_email,
    list_teachers, update_teacher,
};

pub fn init_teachers_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_teacher).get(list_teachers))
        .route("/me", get(get_current_teacher))
        .route("/by-email", get(get_teacher_by_email))
        .route(
            "/{id}",
            get(get_teacher).put(update_teacher).delete(delete_teacher),
        )
        .route("/{id}/courses", get(list_teacher_courses))
}
