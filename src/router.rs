use crate::docs::ApiDoc;
use crate::logging::logging_middleware;
use crate::metrics::metrics_middleware;
use crate::modules::admissions::{init_admissions_router, init_screening_router};
use crate::modules::announcements::init_announcements_router;
use crate::modules::courses::init_courses_router;
use crate::modules::dashboard::init_dashboard_router;
use crate::modules::departments::init_departments_router;
use crate::modules::events::init_events_router;
use crate::modules::exams::init_exams_router;
use crate::modules::files::init_files_router;
use crate::modules::levels::init_levels_router;
use crate::modules::programs::init_programs_router;
use crate::modules::results::init_results_router;
use crate::modules::students::init_students_router;
use crate::modules::teachers::init_teachers_router;
use crate::modules::timetables::init_timetables_router;
use crate::modules::users::init_users_router;
use crate::state::AppState;
use axum::http::{HeaderValue, Method};
use axum::{Router, middleware};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable as _};
use utoipa_swagger_ui::SwaggerUi;

fn api_router() -> Router<AppState> {
    Router::new()
        .nest("/users", init_users_router())
        .nest("/departments", init_departments_router())
        .nest("/programs", init_programs_router())
        .nest("/courses", init_courses_router())
        .nest("/teachers", init_teachers_router())
        .nest("/students", init_students_router())
        .nest("/admissions", init_admissions_router())
        .nest("/screening-slots", init_screening_router())
        .nest("/timetables", init_timetables_router())
        .nest("/exams", init_exams_router())
        .nest("/results", init_results_router())
        .nest("/announcements", init_announcements_router())
        .nest("/events", init_events_router())
        .nest("/levels", init_levels_router())
        .nest("/files", init_files_router())
        .nest("/dashboard", init_dashboard_router())
}

fn cors_layer(state: &AppState) -> CorsLayer {
    let allowed_origins: Vec<HeaderValue> = state
        .cors_config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
        ])
        .allow_credentials(true)
}

/// The full HTTP surface: `/api`, stored files under `/files` and the API
/// docs. `/metrics` is merged separately by the binary.
pub fn init_router(state: AppState) -> Router {
    let uploads = ServeDir::new(&state.storage_config.upload_dir);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(Scalar::with_url("/scalar", ApiDoc::openapi()))
        .nest("/api", api_router())
        .nest_service("/files", uploads)
        .with_state(state.clone())
        .layer(middleware::from_fn(metrics_middleware))
        .layer(cors_layer(&state))
        .layer(middleware::from_fn(logging_middleware))
}
