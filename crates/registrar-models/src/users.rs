//! Users and role resolution.
//!
//! A user row mirrors one identity-provider subject. It is created on the
//! first authenticated request and carries the role that gates every other
//! module.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use crate::ids::UserId;
use crate::students::StudentStatus;
use registrar_core::{PaginationParams, Resource, Role};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: UserId,
    /// Subject of the identity provider's token.
    pub external_identity_ref: String,
    pub email: String,
    pub name: Option<String>,
    pub image_url: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateUserRoleDto {
    pub role: Role,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserFilterParams {
    pub role: Option<Role>,
    #[serde(default, deserialize_with = "registrar_core::serde::empty_string_as_none")]
    pub email: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

registrar_core::text_enum! {
    /// Where a user stands in admissions. `not_started` until an
    /// application exists.
    pub enum ApplicationStage {
        NotStarted => "not_started",
        Progress => "progress",
        Admitted => "admitted",
        Rejected => "rejected",
    }
}

impl From<Option<StudentStatus>> for ApplicationStage {
    fn from(status: Option<StudentStatus>) -> Self {
        match status {
            None => Self::NotStarted,
            Some(StudentStatus::Progress) => Self::Progress,
            Some(StudentStatus::Admitted) => Self::Admitted,
            Some(StudentStatus::Rejected) => Self::Rejected,
        }
    }
}

/// Client route a user should land on after signing in.
pub fn landing_route(role: Role, stage: ApplicationStage) -> &'static str {
    match (role, stage) {
        (Role::Admin, _) => "/admin",
        (Role::Teacher, _) => "/teacher",
        (Role::Student, ApplicationStage::Admitted) => "/student",
        (Role::Student, ApplicationStage::Progress) => "/progress",
        (Role::Student, ApplicationStage::Rejected) => "/rejection",
        (Role::Student, ApplicationStage::NotStarted) => "/application",
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RoleAndStatus {
    pub role: Role,
    pub application_stage: ApplicationStage,
    pub landing: String,
}

impl RoleAndStatus {
    pub fn new(role: Role, status: Option<StudentStatus>) -> Self {
        let stage = ApplicationStage::from(status);
        Self {
            role,
            application_stage: stage,
            landing: landing_route(role, stage).to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct NavigationResponse {
    pub role: Role,
    pub items: Vec<NavigationItem>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct NavigationItem {
    pub resource: Resource,
    pub can_manage: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landing_routes() {
        assert_eq!(RoleAndStatus::new(Role::Admin, None).landing, "/admin");
        assert_eq!(
            RoleAndStatus::new(Role::Teacher, Some(StudentStatus::Admitted)).landing,
            "/teacher"
        );
        assert_eq!(
            RoleAndStatus::new(Role::Student, Some(StudentStatus::Admitted)).landing,
            "/student"
        );
        assert_eq!(
            RoleAndStatus::new(Role::Student, Some(StudentStatus::Progress)).landing,
            "/progress"
        );
        assert_eq!(
            RoleAndStatus::new(Role::Student, Some(StudentStatus::Rejected)).landing,
            "/rejection"
        );
        let fresh = RoleAndStatus::new(Role::Student, None);
        assert_eq!(fresh.landing, "/application");
        assert_eq!(fresh.application_stage, ApplicationStage::NotStarted);
    }
}
