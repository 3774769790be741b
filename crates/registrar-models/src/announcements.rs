use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::ids::{AnnouncementId, UserId};
use registrar_core::Role;

registrar_core::text_enum! {
    /// Audience of an announcement.
    pub enum AnnouncementTarget {
        Student => "student",
        Teacher => "teacher",
        Both => "both",
    }
}

/// Admins see everything. Others see announcements aimed at `both` or at
/// their own role.
pub fn is_visible_to(targets: &[AnnouncementTarget], role: Role) -> bool {
    match role {
        Role::Admin => true,
        Role::Teacher => targets
            .iter()
            .any(|t| matches!(t, AnnouncementTarget::Both | AnnouncementTarget::Teacher)),
        Role::Student => targets
            .iter()
            .any(|t| matches!(t, AnnouncementTarget::Both | AnnouncementTarget::Student)),
    }
}

/// Targets a role may read, as bound to the `target_roles && $1` filter.
pub fn visible_targets(role: Role) -> Vec<AnnouncementTarget> {
    AnnouncementTarget::ALL
        .iter()
        .copied()
        .filter(|t| is_visible_to(&[*t], role))
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Announcement {
    pub id: AnnouncementId,
    pub title: String,
    pub content: String,
    pub target_roles: Vec<AnnouncementTarget>,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

/// Announcement with its author's display fields.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct AnnouncementWithCreator {
    pub id: AnnouncementId,
    pub title: String,
    pub content: String,
    pub target_roles: Vec<AnnouncementTarget>,
    pub created_by: UserId,
    pub creator_name: Option<String>,
    pub creator_email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateAnnouncementDto {
    #[validate(length(min = 1, max = 200, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Content is required"))]
    pub content: String,
    #[validate(length(min = 1, message = "At least one target role is required"))]
    pub target_roles: Vec<AnnouncementTarget>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility() {
        use AnnouncementTarget::*;
        assert!(is_visible_to(&[Student], Role::Admin));
        assert!(is_visible_to(&[Both], Role::Teacher));
        assert!(is_visible_to(&[Teacher], Role::Teacher));
        assert!(!is_visible_to(&[Student], Role::Teacher));
        assert!(is_visible_to(&[Teacher, Student], Role::Student));
        assert!(!is_visible_to(&[], Role::Student));
    }

    #[test]
    fn test_visible_targets() {
        assert_eq!(
            visible_targets(Role::Student),
            vec![AnnouncementTarget::Student, AnnouncementTarget::Both]
        );
        assert_eq!(visible_targets(Role::Admin).len(), 3);
    }

    #[test]
    fn test_create_requires_targets() {
        let dto = CreateAnnouncementDto {
            title: "Resumption".to_string(),
            content: "Classes resume on Monday".to_string(),
            target_roles: vec![],
        };
        assert!(dto.validate().is_err());
    }
}
