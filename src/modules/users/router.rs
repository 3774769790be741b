use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::state::AppState;

use super::controller::{
    get_current_user, get_navigation, get_role_and_status, list_users, sync_user,
    update_user_role,
};

pub fn init_users_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users))
        .route("/me", get(get_current_user))
        .route("/me/role-status", get(get_role_and_status))
        .route("/me/navigation", get(get_navigation))
        .route("/sync", post(sync_user))
        .route("/{id}/role", patch(update_user_role))
}
