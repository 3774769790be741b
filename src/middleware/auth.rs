use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use registrar_auth::{Claims, verify_token};
use registrar_core::{AppError, Role};
use registrar_models::{User, UserId};

use crate::modules::users::service::UserService;
use crate::state::AppState;

/// Extractor that verifies the bearer token and resolves the caller's local
/// user row. The row is created on the first authenticated request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub claims: Claims,
    pub user: User,
}

impl AuthUser {
    pub fn user_id(&self) -> UserId {
        self.user.id
    }

    pub fn role(&self) -> Role {
        self.user.role
    }

    pub fn email(&self) -> &str {
        &self.user.email
    }

    pub fn is_admin(&self) -> bool {
        self.user.role == Role::Admin
    }
}

/// Token from an `Authorization: Bearer <token>` header value.
pub(crate) fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let auth_header = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::unauthorized("Missing authorization header"))?;

    auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::unauthorized("Invalid authorization header format"))
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let claims = verify_token(token, &state.jwt_config)?;
        let user = UserService::resolve_user(&state.db, &claims).await?;

        Ok(AuthUser { claims, user })
    }
}

/// Creates an extractor that only admits roles allowed to perform `$action`
/// on `$resource`.
#[macro_export]
macro_rules! require_capability {
    ($name:ident, $resource:ident, $action:ident) => {
        #[derive(Debug, Clone)]
        pub struct $name(pub $crate::middleware::auth::AuthUser);

        impl axum::extract::FromRequestParts<$crate::state::AppState> for $name {
            type Rejection = registrar_core::AppError;

            async fn from_request_parts(
                parts: &mut axum::http::request::Parts,
                state: &$crate::state::AppState,
            ) -> Result<Self, Self::Rejection> {
                let auth_user =
                    $crate::middleware::auth::AuthUser::from_request_parts(parts, state).await?;

                if !registrar_core::permissions::is_allowed(
                    auth_user.role(),
                    registrar_core::Resource::$resource,
                    registrar_core::Action::$action,
                ) {
                    return Err(registrar_core::AppError::forbidden(format!(
                        "Access denied. {} role cannot {} {}",
                        auth_user.role(),
                        stringify!($action).to_lowercase(),
                        stringify!($resource).to_lowercase(),
                    )));
                }

                Ok($name(auth_user))
            }
        }
    };
}

require_capability!(RequireTeachersView, Teachers, View);
require_capability!(RequireTeachersManage, Teachers, Manage);

require_capability!(RequireStudentsView, Students, View);
require_capability!(RequireStudentsManage, Students, Manage);

require_capability!(RequireCoursesManage, Courses, Manage);

require_capability!(RequireDepartmentsView, Departments, View);
require_capability!(RequireDepartmentsManage, Departments, Manage);

require_capability!(RequireTimetableManage, Timetable, Manage);

require_capability!(RequireApplicantsView, Applicants, View);
require_capability!(RequireApplicantsManage, Applicants, Manage);

require_capability!(RequireScreeningView, Screening, View);
require_capability!(RequireScreeningManage, Screening, Manage);

require_capability!(RequireExamsManage, Exams, Manage);

require_capability!(RequireResultsManage, Results, Manage);

require_capability!(RequireEventsManage, Events, Manage);

require_capability!(RequireAnnouncementsManage, Announcements, Manage);

require_capability!(RequireUsersView, Users, View);
require_capability!(RequireUsersManage, Users, Manage);

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(header_value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/users/me");
        if let Some(value) = header_value {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        let (parts, _) = builder.body(()).unwrap().into_parts();
        parts
    }

    #[test]
    fn test_bearer_token_extracted() {
        let parts = parts_with(Some("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&parts).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_missing_header_is_unauthorized() {
        let parts = parts_with(None);
        let err = bearer_token(&parts).unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::UNAUTHORIZED);
        assert_eq!(err.error.to_string(), "Missing authorization header");
    }

    #[test]
    fn test_wrong_scheme_is_unauthorized() {
        let parts = parts_with(Some("Basic dXNlcjpwYXNz"));
        let err = bearer_token(&parts).unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::UNAUTHORIZED);
        assert_eq!(err.error.to_string(), "Invalid authorization header format");
    }
}
