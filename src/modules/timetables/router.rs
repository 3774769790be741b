use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{
    create_timetable, delete_timetable, find_timetable, get_timetable, get_timetable_calendar,
    list_timetables, update_timetable,
};

pub fn init_timetables_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_timetable).get(list_timetables))
        .route("/lookup", get(find_timetable))
        .route(
            "/{id}",
            get(get_timetable)
                .put(update_timetable)
                .delete(delete_timetable),
        )
        .route("/{id}/calendar", get(get_timetable_calendar))
}
