//! Exam timetable entries.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::ids::{CourseId, ExamId, LevelId, ProgramId, TeacherId};
use crate::value_types::{ClockTime, TimeRange};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ExamTimetable {
    pub id: ExamId,
    pub course_id: CourseId,
    pub teacher_id: TeacherId,
    pub invigilator_id: Option<TeacherId>,
    pub exam_hall: String,
    pub date: NaiveDate,
    pub start_time: ClockTime,
    pub end_time: ClockTime,
    pub semester: String,
    pub program_id: ProgramId,
    pub level_id: LevelId,
    pub created_at: DateTime<Utc>,
}

impl ExamTimetable {
    pub fn range(&self) -> TimeRange {
        TimeRange {
            start: self.start_time,
            end: self.end_time,
        }
    }
}

/// Exam row joined with display names for listings.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct ExamTimetableDetails {
    pub id: ExamId,
    pub course_id: CourseId,
    pub course_code: String,
    pub course_name: String,
    pub teacher_id: TeacherId,
    pub teacher_name: String,
    pub invigilator_id: Option<TeacherId>,
    pub invigilator_name: Option<String>,
    pub exam_hall: String,
    pub date: NaiveDate,
    pub start_time: ClockTime,
    pub end_time: ClockTime,
    pub semester: String,
    pub program_id: ProgramId,
    pub level_id: LevelId,
    pub level_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_create_times"))]
pub struct CreateExamDto {
    pub course_id: CourseId,
    pub teacher_id: TeacherId,
    pub invigilator_id: Option<TeacherId>,
    #[validate(length(min = 1, max = 100, message = "Exam hall is required"))]
    pub exam_hall: String,
    pub date: NaiveDate,
    pub start_time: ClockTime,
    pub end_time: ClockTime,
    #[validate(length(min = 1, max = 50, message = "Semester is required"))]
    pub semester: String,
    pub program_id: ProgramId,
    pub level_id: LevelId,
}

fn validate_create_times(dto: &CreateExamDto) -> Result<(), ValidationError> {
    check_times(dto.start_time, dto.end_time)
}

fn check_times(start: ClockTime, end: ClockTime) -> Result<(), ValidationError> {
    if start >= end {
        return Err(ValidationError::new("time_range")
            .with_message("Start time must be before end time".into()));
    }
    Ok(())
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateExamDto {
    pub course_id: Option<CourseId>,
    pub teacher_id: Option<TeacherId>,
    pub invigilator_id: Option<TeacherId>,
    #[validate(length(min = 1, max = 100))]
    pub exam_hall: Option<String>,
    pub date: Option<NaiveDate>,
    pub start_time: Option<ClockTime>,
    pub end_time: Option<ClockTime>,
    #[validate(length(min = 1, max = 50))]
    pub semester: Option<String>,
    pub program_id: Option<ProgramId>,
    pub level_id: Option<LevelId>,
}

impl UpdateExamDto {
    /// The entry as it would look after the update. Times are re-checked
    /// because a partial update can invert them.
    pub fn apply_to(&self, current: &ExamTimetable) -> Result<ExamTimetable, ValidationError> {
        let updated = ExamTimetable {
            id: current.id,
            course_id: self.course_id.unwrap_or(current.course_id),
            teacher_id: self.teacher_id.unwrap_or(current.teacher_id),
            invigilator_id: self.invigilator_id.or(current.invigilator_id),
            exam_hall: self
                .exam_hall
                .clone()
                .unwrap_or_else(|| current.exam_hall.clone()),
            date: self.date.unwrap_or(current.date),
            start_time: self.start_time.unwrap_or(current.start_time),
            end_time: self.end_time.unwrap_or(current.end_time),
            semester: self
                .semester
                .clone()
                .unwrap_or_else(|| current.semester.clone()),
            program_id: self.program_id.unwrap_or(current.program_id),
            level_id: self.level_id.unwrap_or(current.level_id),
            created_at: current.created_at,
        };
        check_times(updated.start_time, updated.end_time)?;
        Ok(updated)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExamClash {
    Hall { other: ExamId, hall: String },
    Teacher { other: ExamId, teacher_id: TeacherId },
    Invigilator { other: ExamId, teacher_id: TeacherId },
}

impl fmt::Display for ExamClash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hall { other, hall } => {
                write!(f, "Exam hall '{}' is already booked by exam {}", hall, other)
            }
            Self::Teacher { other, teacher_id } => write!(
                f,
                "Teacher {} is already assigned to exam {} at that time",
                teacher_id, other
            ),
            Self::Invigilator { other, teacher_id } => write!(
                f,
                "Invigilator {} is already assigned to exam {} at that time",
                teacher_id, other
            ),
        }
    }
}

impl std::error::Error for ExamClash {}

fn staff(exam: &ExamTimetable) -> impl Iterator<Item = TeacherId> + '_ {
    std::iter::once(exam.teacher_id).chain(exam.invigilator_id)
}

/// First clash between `candidate` and `existing` entries on the same date
/// with overlapping times. Entries with the candidate's own id are ignored.
pub fn find_exam_clash(candidate: &ExamTimetable, existing: &[ExamTimetable]) -> Option<ExamClash> {
    existing
        .iter()
        .filter(|e| e.id != candidate.id && e.date == candidate.date)
        .filter(|e| e.range().overlaps(&candidate.range()))
        .find_map(|e| {
            if e.exam_hall.trim().eq_ignore_ascii_case(candidate.exam_hall.trim()) {
                return Some(ExamClash::Hall {
                    other: e.id,
                    hall: candidate.exam_hall.clone(),
                });
            }
            let busy: Vec<TeacherId> = staff(e).collect();
            if busy.contains(&candidate.teacher_id) {
                return Some(ExamClash::Teacher {
                    other: e.id,
                    teacher_id: candidate.teacher_id,
                });
            }
            candidate
                .invigilator_id
                .filter(|id| busy.contains(id))
                .map(|teacher_id| ExamClash::Invigilator {
                    other: e.id,
                    teacher_id,
                })
        })
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ExamFilterParams {
    #[serde(default, deserialize_with = "registrar_core::serde::deserialize_optional_id")]
    pub program_id: Option<ProgramId>,
    #[serde(default, deserialize_with = "registrar_core::serde::empty_string_as_none")]
    pub semester: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exam(hall: &str, start: &str, end: &str, teacher: TeacherId) -> ExamTimetable {
        ExamTimetable {
            id: ExamId::new(),
            course_id: CourseId::new(),
            teacher_id: teacher,
            invigilator_id: None,
            exam_hall: hall.to_string(),
            date: NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
            start_time: start.parse().unwrap(),
            end_time: end.parse().unwrap(),
            semester: "First".to_string(),
            program_id: ProgramId::new(),
            level_id: LevelId::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_same_hall_overlap_clashes() {
        let existing = exam("Main Hall", "09:00", "11:00", TeacherId::new());
        let candidate = exam("main hall", "10:00", "12:00", TeacherId::new());
        assert!(matches!(
            find_exam_clash(&candidate, &[existing]),
            Some(ExamClash::Hall { .. })
        ));
    }

    #[test]
    fn test_teacher_invigilating_elsewhere_clashes() {
        let teacher = TeacherId::new();
        let mut existing = exam("Hall A", "09:00", "11:00", TeacherId::new());
        existing.invigilator_id = Some(teacher);
        let candidate = exam("Hall B", "10:00", "12:00", teacher);
        assert!(matches!(
            find_exam_clash(&candidate, &[existing]),
            Some(ExamClash::Teacher { .. })
        ));
    }

    #[test]
    fn test_invigilator_clash() {
        let invigilator = TeacherId::new();
        let existing = exam("Hall A", "09:00", "11:00", invigilator);
        let mut candidate = exam("Hall B", "10:00", "12:00", TeacherId::new());
        candidate.invigilator_id = Some(invigilator);
        assert!(matches!(
            find_exam_clash(&candidate, &[existing]),
            Some(ExamClash::Invigilator { .. })
        ));
    }

    #[test]
    fn test_no_clash_on_other_date_or_adjacent_time() {
        let teacher = TeacherId::new();
        let mut other_day = exam("Hall A", "09:00", "11:00", teacher);
        other_day.date = NaiveDate::from_ymd_opt(2025, 6, 3).unwrap();
        let adjacent = exam("Hall A", "07:00", "09:00", teacher);
        let candidate = exam("Hall A", "09:00", "11:00", teacher);
        assert!(find_exam_clash(&candidate, &[other_day, adjacent]).is_none());
    }

    #[test]
    fn test_entry_does_not_clash_with_itself() {
        let entry = exam("Hall A", "09:00", "11:00", TeacherId::new());
        assert!(find_exam_clash(&entry, std::slice::from_ref(&entry)).is_none());
    }

    #[test]
    fn test_partial_update_rechecks_times() {
        let current = exam("Hall A", "09:00", "11:00", TeacherId::new());
        let dto = UpdateExamDto {
            start_time: Some("12:00".parse().unwrap()),
            ..Default::default()
        };
        assert!(dto.apply_to(&current).is_err());

        let dto = UpdateExamDto {
            end_time: Some("12:00".parse().unwrap()),
            exam_hall: Some("Hall C".to_string()),
            ..Default::default()
        };
        let updated = dto.apply_to(&current).unwrap();
        assert_eq!(updated.exam_hall, "Hall C");
        assert_eq!(updated.end_time.to_string(), "12:00");
    }
}
