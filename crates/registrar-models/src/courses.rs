//! Courses and their program/teacher links.

use std::collections::HashSet;
use std::hash::Hash;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::ids::{CourseId, ProgramId, TeacherId};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Course {
    pub id: CourseId,
    pub name: String,
    pub code: String,
    pub credit_unit: i32,
    pub semester: String,
    pub is_general: bool,
    /// Empty for general courses.
    pub program_ids: Vec<ProgramId>,
    pub teacher_ids: Vec<TeacherId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Course {
    /// General courses are offered to every program.
    pub fn is_offered_to(&self, program_id: ProgramId) -> bool {
        self.is_general || self.program_ids.contains(&program_id)
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_create_programs"))]
pub struct CreateCourseDto {
    #[validate(length(min = 1, max = 200, message = "Course name is required"))]
    pub name: String,
    #[validate(length(min = 1, max = 20, message = "Course code is required"))]
    pub code: String,
    #[validate(range(min = 1, message = "Credit unit must be positive"))]
    pub credit_unit: i32,
    #[validate(length(min = 1, message = "Semester is required"))]
    pub semester: String,
    #[serde(default)]
    pub is_general: bool,
    #[serde(default)]
    pub program_ids: Vec<ProgramId>,
    #[serde(default)]
    pub teacher_ids: Vec<TeacherId>,
}

fn validate_create_programs(dto: &CreateCourseDto) -> Result<(), ValidationError> {
    check_program_links(dto.is_general, &dto.program_ids)
}

/// Partial update. When `program_ids` or `teacher_ids` is given, the stored
/// links are reconciled to exactly that set.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_update_programs"))]
pub struct UpdateCourseDto {
    #[validate(length(min = 1, max = 200, message = "Course name is required"))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 20, message = "Course code is required"))]
    pub code: Option<String>,
    #[validate(range(min = 1, message = "Credit unit must be positive"))]
    pub credit_unit: Option<i32>,
    #[validate(length(min = 1, message = "Semester is required"))]
    pub semester: Option<String>,
    pub is_general: Option<bool>,
    pub program_ids: Option<Vec<ProgramId>>,
    pub teacher_ids: Option<Vec<TeacherId>>,
}

fn validate_update_programs(dto: &UpdateCourseDto) -> Result<(), ValidationError> {
    match (dto.is_general, &dto.program_ids) {
        (Some(is_general), Some(ids)) => check_program_links(is_general, ids),
        (Some(true), None) => Ok(()),
        (Some(false), None) => Err(ValidationError::new("program_ids_required")
            .with_message("A non-general course must be offered to at least one program".into())),
        (None, _) => Ok(()),
    }
}

/// `is_general` ⇔ no program links.
pub fn check_program_links(is_general: bool, program_ids: &[ProgramId]) -> Result<(), ValidationError> {
    match (is_general, program_ids.is_empty()) {
        (true, false) => Err(ValidationError::new("general_course_programs")
            .with_message("A general course cannot be tied to specific programs".into())),
        (false, true) => Err(ValidationError::new("program_ids_required")
            .with_message("A non-general course must be offered to at least one program".into())),
        _ => Ok(()),
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CourseFilterParams {
    #[serde(default, deserialize_with = "registrar_core::serde::deserialize_optional_id")]
    pub program_id: Option<ProgramId>,
    #[serde(default, deserialize_with = "registrar_core::serde::deserialize_optional_id")]
    pub teacher_id: Option<TeacherId>,
    #[serde(default, deserialize_with = "registrar_core::serde::empty_string_as_none")]
    pub semester: Option<String>,
}

/// Links to add and links to drop when moving from one id set to another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdDiff<T> {
    pub added: Vec<T>,
    pub removed: Vec<T>,
}

/// Order of `new` is kept for `added` and of `old` for `removed`.
/// Duplicates collapse.
pub fn diff_ids<T: Copy + Eq + Hash>(old: &[T], new: &[T]) -> IdDiff<T> {
    let old_set: HashSet<T> = old.iter().copied().collect();
    let new_set: HashSet<T> = new.iter().copied().collect();

    let mut seen = HashSet::new();
    let added = new
        .iter()
        .copied()
        .filter(|id| !old_set.contains(id) && seen.insert(*id))
        .collect();

    let mut seen = HashSet::new();
    let removed = old
        .iter()
        .copied()
        .filter(|id| !new_set.contains(id) && seen.insert(*id))
        .collect();

    IdDiff { added, removed }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_dto(is_general: bool, program_ids: Vec<ProgramId>) -> CreateCourseDto {
        CreateCourseDto {
            name: "Anatomy".to_string(),
            code: "ANA101".to_string(),
            credit_unit: 3,
            semester: "First".to_string(),
            is_general,
            program_ids,
            teacher_ids: vec![],
        }
    }

    #[test]
    fn test_general_course_cannot_have_programs() {
        assert!(create_dto(true, vec![]).validate().is_ok());
        assert!(create_dto(true, vec![ProgramId::new()]).validate().is_err());
    }

    #[test]
    fn test_program_course_needs_a_program() {
        assert!(create_dto(false, vec![]).validate().is_err());
        assert!(create_dto(false, vec![ProgramId::new()]).validate().is_ok());
    }

    #[test]
    fn test_credit_unit_must_be_positive() {
        let mut dto = create_dto(true, vec![]);
        dto.credit_unit = 0;
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_update_switching_to_program_course_needs_programs() {
        let dto = UpdateCourseDto {
            name: None,
            code: None,
            credit_unit: None,
            semester: None,
            is_general: Some(false),
            program_ids: None,
            teacher_ids: None,
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_is_offered_to() {
        let p1 = ProgramId::new();
        let p2 = ProgramId::new();
        let course = Course {
            id: CourseId::new(),
            name: "Physiology".to_string(),
            code: "PHY101".to_string(),
            credit_unit: 2,
            semester: "First".to_string(),
            is_general: false,
            program_ids: vec![p1],
            teacher_ids: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(course.is_offered_to(p1));
        assert!(!course.is_offered_to(p2));

        let general = Course {
            is_general: true,
            program_ids: vec![],
            ..course
        };
        assert!(general.is_offered_to(p2));
    }

    #[test]
    fn test_diff_ids() {
        let diff = diff_ids(&[1, 2, 3], &[3, 4, 4, 5]);
        assert_eq!(diff.added, vec![4, 5]);
        assert_eq!(diff.removed, vec![1, 2]);

        let diff = diff_ids::<u8>(&[], &[]);
        assert!(diff.added.is_empty() && diff.removed.is_empty());
    }
}
