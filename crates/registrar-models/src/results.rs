//! Course results, the grade table and CGPA.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::ids::{CourseId, ResultId, StudentId, TeacherId};
use registrar_core::PaginationParams;

registrar_core::text_enum! {
    pub enum Grade {
        A => "A",
        B => "B",
        C => "C",
        D => "D",
        E => "E",
        F => "F",
    }
}

impl Grade {
    /// Grade for a total mark out of 100.
    pub fn from_total(total: f64) -> Self {
        match total {
            t if t >= 70.0 => Self::A,
            t if t >= 60.0 => Self::B,
            t if t >= 55.0 => Self::C,
            t if t >= 45.0 => Self::D,
            t if t >= 40.0 => Self::E,
            _ => Self::F,
        }
    }

    pub const fn points(&self) -> i32 {
        match self {
            Self::A => 5,
            Self::B => 4,
            Self::C => 3,
            Self::D => 2,
            Self::E => 1,
            Self::F => 0,
        }
    }
}

/// Marks, grade and credit-weighted points for one course attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Assessment {
    pub total_mark: f64,
    pub grade: Grade,
    pub grade_point: i32,
}

impl Assessment {
    pub fn grade(ca_mark: f64, exam_mark: f64, credit_unit: i32) -> Self {
        let total_mark = ca_mark + exam_mark;
        let grade = Grade::from_total(total_mark);
        Self {
            total_mark,
            grade,
            grade_point: grade.points() * credit_unit,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CourseResult {
    pub id: ResultId,
    pub student_id: StudentId,
    pub course_id: CourseId,
    /// Cleared when the teacher record is deleted.
    pub teacher_id: Option<TeacherId>,
    pub ca_mark: f64,
    pub exam_mark: f64,
    pub total_mark: f64,
    pub grade: Grade,
    /// Letter points times the course credit unit.
    pub grade_point: i32,
    pub semester: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A result joined with its course.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct StudentResult {
    pub id: ResultId,
    pub student_id: StudentId,
    pub course_id: CourseId,
    pub course_code: String,
    pub course_name: String,
    pub credit_unit: i32,
    pub ca_mark: f64,
    pub exam_mark: f64,
    pub total_mark: f64,
    pub grade: Grade,
    pub grade_point: i32,
    pub semester: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_total"))]
pub struct RecordResultDto {
    pub student_id: StudentId,
    pub course_id: CourseId,
    /// Defaults to the calling teacher.
    pub teacher_id: Option<TeacherId>,
    #[validate(range(min = 0.0, max = 100.0, message = "CA mark must be between 0 and 100"))]
    pub ca_mark: f64,
    #[validate(range(min = 0.0, max = 100.0, message = "Exam mark must be between 0 and 100"))]
    pub exam_mark: f64,
    #[validate(length(min = 1, max = 50, message = "Semester is required"))]
    pub semester: String,
}

fn validate_total(dto: &RecordResultDto) -> Result<(), ValidationError> {
    if dto.ca_mark + dto.exam_mark > 100.0 {
        return Err(ValidationError::new("total_mark")
            .with_message("Total mark cannot exceed 100".into()));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Cgpa {
    pub student_id: StudentId,
    /// Absent for the cumulative figure.
    pub semester: Option<String>,
    pub cgpa: f64,
    pub total_grade_points: i64,
    pub total_credit_units: i64,
}

/// Σ grade points / Σ credit units, rounded to two decimals; 0.00 with no
/// credit units.
pub fn compute_cgpa(total_grade_points: i64, total_credit_units: i64) -> f64 {
    if total_credit_units <= 0 {
        return 0.0;
    }
    let raw = total_grade_points as f64 / total_credit_units as f64;
    (raw * 100.0).round() / 100.0
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ResultFilterParams {
    #[serde(default, deserialize_with = "registrar_core::serde::empty_string_as_none")]
    pub semester: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grade_boundaries() {
        let cases = [
            (100.0, Grade::A),
            (70.0, Grade::A),
            (69.5, Grade::B),
            (60.0, Grade::B),
            (55.0, Grade::C),
            (54.9, Grade::D),
            (45.0, Grade::D),
            (40.0, Grade::E),
            (39.9, Grade::F),
            (0.0, Grade::F),
        ];
        for (total, grade) in cases {
            assert_eq!(Grade::from_total(total), grade, "total {total}");
        }
    }

    #[test]
    fn test_seventy_two_with_three_credits() {
        let a = Assessment::grade(25.0, 47.0, 3);
        assert_eq!(a.total_mark, 72.0);
        assert_eq!(a.grade, Grade::A);
        assert_eq!(a.grade.points(), 5);
        assert_eq!(a.grade_point, 15);
    }

    #[test]
    fn test_failing_grade_has_no_points() {
        let a = Assessment::grade(10.0, 20.0, 4);
        assert_eq!(a.grade, Grade::F);
        assert_eq!(a.grade_point, 0);
    }

    #[test]
    fn test_compute_cgpa() {
        assert_eq!(compute_cgpa(0, 0), 0.0);
        assert_eq!(compute_cgpa(15 + 8, 3 + 2), 4.6);
        assert_eq!(compute_cgpa(10, 3), 3.33);
        assert_eq!(compute_cgpa(20, 3), 6.67);
    }

    fn dto(ca: f64, exam: f64) -> RecordResultDto {
        RecordResultDto {
            student_id: StudentId::new(),
            course_id: CourseId::new(),
            teacher_id: None,
            ca_mark: ca,
            exam_mark: exam,
            semester: "First".to_string(),
        }
    }

    #[test]
    fn test_marks_validation() {
        assert!(dto(30.0, 70.0).validate().is_ok());
        assert!(dto(-1.0, 50.0).validate().is_err());
        assert!(dto(40.0, 61.0).validate().is_err());
    }
}
