use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    create_department, delete_department, get_department, list_departments, promote_department,
    update_department,
};
use crate::modules::programs::controller::list_department_programs;

pub fn init_departments_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_department).get(list_departments))
        .route(
            "/{id}",
            get(get_department)
                .put(update_department)
                .delete(delete_department),
        )
        .route("/{id}/programs", get(list_department_programs))
        .route("/{id}/promote", post(promote_department))
}
