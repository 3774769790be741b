use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::modules::courses::controller::list_program_courses;
use crate::state::AppState;

use super::controller::{
    create_program, delete_program, get_program, list_programs, promote_program, update_program,
    update_program_counts,
};

pub fn init_programs_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_program).get(list_programs))
        .route(
            "/{id}",
            get(get_program).put(update_program).delete(delete_program),
        )
        .route("/{id}/courses", get(list_program_courses))
        .route("/{id}/counts", patch(update_program_counts))
        .route("/{id}/promote", post(promote_program))
}
