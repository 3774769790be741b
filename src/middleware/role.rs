//! Role extractors and helpers.
//!
//! Capability checks from [`crate::middleware::auth`] cover most routes.
//! These extractors are for the few routes gated on the role itself, such as
//! applicants submitting their own application.

use axum::{extract::FromRequestParts, http::request::Parts};
use registrar_core::{AppError, Role};

use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Extractor for admin-only access.
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_user = AuthUser::from_request_parts(parts, state).await?;
        check_role(&auth_user, Role::Admin)?;
        Ok(RequireAdmin(auth_user))
    }
}

/// Extractor for staff access (Admin or Teacher).
#[derive(Debug, Clone)]
pub struct RequireStaff(pub AuthUser);

impl FromRequestParts<AppState> for RequireStaff {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_user = AuthUser::from_request_parts(parts, state).await?;
        check_any_role(&auth_user, &[Role::Admin, Role::Teacher])?;
        Ok(RequireStaff(auth_user))
    }
}

/// Extractor for routes that only make sense for students and applicants.
#[derive(Debug, Clone)]
pub struct RequireStudent(pub AuthUser);

impl FromRequestParts<AppState> for RequireStudent {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_user = AuthUser::from_request_parts(parts, state).await?;
        check_role(&auth_user, Role::Student)?;
        Ok(RequireStudent(auth_user))
    }
}

pub fn check_role(auth_user: &AuthUser, required_role: Role) -> Result<(), AppError> {
    check_any_role(auth_user, &[required_role])
}

pub fn check_any_role(auth_user: &AuthUser, allowed_roles: &[Role]) -> Result<(), AppError> {
    ensure_role(auth_user.role(), allowed_roles)
}

fn ensure_role(role: Role, allowed_roles: &[Role]) -> Result<(), AppError> {
    if !allowed_roles.contains(&role) {
        let allowed = allowed_roles
            .iter()
            .map(Role::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        return Err(AppError::forbidden(format!(
            "Access denied. Required roles: {}, but user has role: {}",
            allowed, role
        )));
    }

    Ok(())
}
