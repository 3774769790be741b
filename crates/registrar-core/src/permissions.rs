//! Role-based capability table.
//!
//! Every role gets a fixed set of resources it may see and a smaller set it
//! may change. The table is static; handlers ask [`can_view`] or
//! [`can_manage`] instead of comparing role strings.
//!
//! # Example
//!
//! ```ignore
//! use registrar_core::permissions::{Resource, Role, can_view};
//!
//! assert!(can_view(Role::Teacher, Resource::Students));
//! assert!(!can_view(Role::Student, Resource::Applicants));
//! ```

use serde::Serialize;
use utoipa::ToSchema;

crate::text_enum! {
    /// Role attached to every user.
    pub enum Role {
        Student => "student",
        Teacher => "teacher",
        Admin => "admin",
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Student
    }
}

/// Something a user can navigate to or act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Home,
    Teachers,
    Students,
    Courses,
    Departments,
    Timetable,
    Applicants,
    Screening,
    Exams,
    Results,
    Events,
    Announcements,
    Users,
    Parents,
    Assignments,
    Attendance,
    Messages,
    Profile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    View,
    Manage,
}

const ALL_ROLES: &[Role] = &[Role::Admin, Role::Teacher, Role::Student];
const ADMIN: &[Role] = &[Role::Admin];
const STAFF: &[Role] = &[Role::Admin, Role::Teacher];
const NOBODY: &[Role] = &[];

/// (resource, who may view, who may manage), in menu order.
const TABLE: &[(Resource, &[Role], &[Role])] = &[
    (Resource::Home, ALL_ROLES, NOBODY),
    (Resource::Teachers, ADMIN, ADMIN),
    (Resource::Students, STAFF, ADMIN),
    (Resource::Parents, NOBODY, NOBODY),
    (Resource::Courses, ALL_ROLES, ADMIN),
    (Resource::Departments, STAFF, ADMIN),
    (Resource::Timetable, ALL_ROLES, ADMIN),
    (Resource::Applicants, ADMIN, ADMIN),
    (Resource::Screening, ADMIN, ADMIN),
    (Resource::Exams, ALL_ROLES, ADMIN),
    (Resource::Assignments, NOBODY, NOBODY),
    (Resource::Results, ALL_ROLES, STAFF),
    (Resource::Attendance, NOBODY, NOBODY),
    (Resource::Events, ALL_ROLES, ADMIN),
    (Resource::Messages, NOBODY, NOBODY),
    (Resource::Announcements, ALL_ROLES, ADMIN),
    (Resource::Users, ADMIN, ADMIN),
    (Resource::Profile, ALL_ROLES, ALL_ROLES),
];

pub fn is_allowed(role: Role, resource: Resource, action: Action) -> bool {
    TABLE
        .iter()
        .find(|(r, _, _)| *r == resource)
        .map(|(_, view, manage)| match action {
            Action::View => view.contains(&role),
            Action::Manage => manage.contains(&role),
        })
        .unwrap_or(false)
}

pub fn can_view(role: Role, resource: Resource) -> bool {
    is_allowed(role, resource, Action::View)
}

pub fn can_manage(role: Role, resource: Resource) -> bool {
    is_allowed(role, resource, Action::Manage)
}

/// Resources visible to `role`, in menu order.
pub fn navigation(role: Role) -> Vec<Resource> {
    TABLE
        .iter()
        .filter(|(_, view, _)| view.contains(&role))
        .map(|(resource, _, _)| *resource)
        .collect()
}
