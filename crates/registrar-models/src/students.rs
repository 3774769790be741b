//! Student records and the enrollment rules tied to them.
//!
//! A student row is created by an application submission with status
//! `progress`. Once admitted it occupies one unit of its program's counter
//! for its current level; [`status_effect`] and [`AssignmentChange`] describe
//! how a change to the row must move those counters.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::admissions::ApplicationDocuments;
use crate::ids::{DepartmentId, ProgramId, ScreeningSlotId, StudentId, UserId};
use crate::value_types::Sex;
use registrar_core::PaginationParams;

registrar_core::text_enum! {
    /// Admission decision state.
    pub enum StudentStatus {
        Progress => "progress",
        Admitted => "admitted",
        Rejected => "rejected",
    }
}

registrar_core::text_enum! {
    /// Enrollment bucket of an admitted student.
    pub enum StudentLevel {
        Level1 => "level1",
        Level2 => "level2",
        Graduate => "graduate",
    }
}

impl StudentLevel {
    /// Program counter column holding this level's head count.
    pub const fn counter_column(&self) -> &'static str {
        match self {
            Self::Level1 => "level1_count",
            Self::Level2 => "level2_count",
            Self::Graduate => "graduate_count",
        }
    }

    pub const fn next(&self) -> Option<StudentLevel> {
        match self {
            Self::Level1 => Some(Self::Level2),
            Self::Level2 => Some(Self::Graduate),
            Self::Graduate => None,
        }
    }
}

/// Counter side effect of a status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusEffect {
    /// Entering `admitted`: place the student in level 1 of its program.
    Enroll,
    /// Leaving `admitted`: release the unit held at the current level.
    Unenroll,
    None,
}

pub fn status_effect(old: StudentStatus, new: StudentStatus) -> StatusEffect {
    match (old, new) {
        (StudentStatus::Admitted, StudentStatus::Admitted) => StatusEffect::None,
        (_, StudentStatus::Admitted) => StatusEffect::Enroll,
        (StudentStatus::Admitted, _) => StatusEffect::Unenroll,
        _ => StatusEffect::None,
    }
}

/// One counted unit: a program and the level within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub program_id: ProgramId,
    pub level: StudentLevel,
}

impl Placement {
    pub fn of(program_id: Option<ProgramId>, level: Option<StudentLevel>) -> Option<Self> {
        Some(Self {
            program_id: program_id?,
            level: level?,
        })
    }
}

/// Counter moves for a reassignment: release the old placement, then claim
/// the new one. The two steps stay separate even when both name the same
/// program, so a level change inside one program nets one unit moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AssignmentChange {
    pub release: Option<Placement>,
    pub claim: Option<Placement>,
}

impl AssignmentChange {
    /// Only admitted students hold counter units.
    pub fn plan(
        status: StudentStatus,
        current: Option<Placement>,
        next: Option<Placement>,
    ) -> Self {
        if status != StudentStatus::Admitted {
            return Self::default();
        }
        Self {
            release: current,
            claim: next,
        }
    }
}

/// Secondary-school results as entered on the application form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema, Validate)]
#[serde(default)]
pub struct AcademicRecord {
    pub high_school: String,
    pub graduation_year: String,
    pub gpa: String,
    pub sat_score: String,
    pub act_score: String,
    pub previous_college: bool,
    pub college_courses: String,
    pub secondary_school: String,
    pub exam_type: String,
    pub exam_year: String,
    #[validate(length(max = 9, message = "At most 9 subjects may be listed"))]
    pub subjects: Vec<SubjectGrade>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SubjectGrade {
    pub name: String,
    pub grade: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct HealthInfo {
    pub allergies: String,
    pub medications: String,
    pub conditions: String,
    pub emergency_contact: String,
    pub emergency_phone: String,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Student {
    pub id: StudentId,
    pub user_id: UserId,
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub date_of_birth: NaiveDate,
    pub sex: Sex,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub lga: String,
    pub religion: String,
    pub image_url: Option<String>,
    pub department_id: Option<DepartmentId>,
    pub program_id: Option<ProgramId>,
    pub program_name: Option<String>,
    pub level: Option<StudentLevel>,
    pub concentration: String,
    pub start_term: String,
    #[schema(value_type = AcademicRecord)]
    pub academic: Json<AcademicRecord>,
    #[schema(value_type = HealthInfo)]
    pub health: Json<HealthInfo>,
    #[schema(value_type = ApplicationDocuments)]
    pub documents: Json<ApplicationDocuments>,
    pub recommendation_letters: i32,
    pub agree_terms: bool,
    pub application_number: String,
    pub application_date: DateTime<Utc>,
    pub screening_slot_id: Option<ScreeningSlotId>,
    pub status: StudentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Student {
    pub fn full_name(&self) -> String {
        [&self.first_name, &self.middle_name, &self.last_name]
            .iter()
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.trim())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn placement(&self) -> Option<Placement> {
        Placement::of(self.program_id, self.level)
    }
}

/// Row of the applicant/student list views.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct StudentSummary {
    pub id: StudentId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub sex: Sex,
    pub image_url: Option<String>,
    pub department_id: Option<DepartmentId>,
    pub department_name: Option<String>,
    pub program_id: Option<ProgramId>,
    pub program_name: Option<String>,
    pub level: Option<StudentLevel>,
    pub application_number: String,
    pub application_date: DateTime<Utc>,
    pub status: StudentStatus,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusDto {
    pub status: StudentStatus,
}

/// Reassign a student. Omitted fields keep their current value.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[validate(schema(function = "validate_assignment_change"))]
pub struct UpdateStudentAssignmentDto {
    pub department_id: Option<DepartmentId>,
    pub program_id: Option<ProgramId>,
    pub level: Option<StudentLevel>,
}

fn validate_assignment_change(dto: &UpdateStudentAssignmentDto) -> Result<(), ValidationError> {
    if dto.department_id.is_none() && dto.program_id.is_none() && dto.level.is_none() {
        return Err(ValidationError::new("empty_assignment")
            .with_message("At least one of department_id, program_id or level is required".into()));
    }
    Ok(())
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StudentFilterParams {
    pub status: Option<StudentStatus>,
    #[serde(default, deserialize_with = "registrar_core::serde::deserialize_optional_id")]
    pub department_id: Option<DepartmentId>,
    #[serde(default, deserialize_with = "registrar_core::serde::deserialize_optional_id")]
    pub program_id: Option<ProgramId>,
    pub level: Option<StudentLevel>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_effects() {
        use StudentStatus::*;
        assert_eq!(status_effect(Progress, Admitted), StatusEffect::Enroll);
        assert_eq!(status_effect(Rejected, Admitted), StatusEffect::Enroll);
        assert_eq!(status_effect(Admitted, Admitted), StatusEffect::None);
        assert_eq!(status_effect(Admitted, Rejected), StatusEffect::Unenroll);
        assert_eq!(status_effect(Admitted, Progress), StatusEffect::Unenroll);
        assert_eq!(status_effect(Progress, Rejected), StatusEffect::None);
        assert_eq!(status_effect(Rejected, Progress), StatusEffect::None);
    }

    #[test]
    fn test_level_progression() {
        assert_eq!(StudentLevel::Level1.next(), Some(StudentLevel::Level2));
        assert_eq!(StudentLevel::Level2.next(), Some(StudentLevel::Graduate));
        assert_eq!(StudentLevel::Graduate.next(), None);
        assert_eq!(StudentLevel::Level2.counter_column(), "level2_count");
    }

    #[test]
    fn test_level_text_form() {
        assert_eq!(StudentLevel::Level1.as_str(), "level1");
        assert_eq!("graduate".parse::<StudentLevel>().unwrap(), StudentLevel::Graduate);
        assert!("level3".parse::<StudentLevel>().is_err());
        assert_eq!(
            serde_json::to_string(&StudentStatus::Admitted).unwrap(),
            r#""admitted""#
        );
    }

    #[test]
    fn test_assignment_plan_only_moves_admitted_students() {
        let program = ProgramId::new();
        let current = Placement::of(Some(program), Some(StudentLevel::Level1));
        let next = Placement::of(Some(program), Some(StudentLevel::Level2));

        let plan = AssignmentChange::plan(StudentStatus::Progress, current, next);
        assert_eq!(plan, AssignmentChange::default());

        let plan = AssignmentChange::plan(StudentStatus::Admitted, current, next);
        assert_eq!(plan.release, current);
        assert_eq!(plan.claim, next);
    }

    #[test]
    fn test_placement_requires_program_and_level() {
        assert!(Placement::of(None, Some(StudentLevel::Level1)).is_none());
        assert!(Placement::of(Some(ProgramId::new()), None).is_none());
    }

    #[test]
    fn test_assignment_dto_requires_a_field() {
        let dto = UpdateStudentAssignmentDto {
            department_id: None,
            program_id: None,
            level: None,
        };
        assert!(dto.validate().is_err());

        let dto = UpdateStudentAssignmentDto {
            department_id: None,
            program_id: None,
            level: Some(StudentLevel::Level2),
        };
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn test_academic_record_subject_limit() {
        let mut record = AcademicRecord {
            subjects: vec![SubjectGrade::default(); 9],
            ..Default::default()
        };
        assert!(record.validate().is_ok());
        record.subjects.push(SubjectGrade::default());
        assert!(record.validate().is_err());
    }
}
