//! Weekly class timetables.
//!
//! Schedules arrive as loosely-typed input ([`DayScheduleInput`]) and are
//! normalized by [`normalize_schedule`] into checked [`DaySchedule`]s before
//! they are stored. [`find_clash`] compares a schedule against the other
//! timetables of the same semester and [`project_week`] lays one out on a
//! concrete calendar week.

use std::collections::{HashMap, HashSet};
use std::fmt;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::ids::{CourseId, DepartmentId, ProgramId, TeacherId, TimetableId};
use crate::students::StudentLevel;
use crate::value_types::{ClockTime, TimeRange};

registrar_core::text_enum! {
    pub enum Weekday {
        Monday => "Monday",
        Tuesday => "Tuesday",
        Wednesday => "Wednesday",
        Thursday => "Thursday",
        Friday => "Friday",
        Saturday => "Saturday",
        Sunday => "Sunday",
    }
}

impl Weekday {
    /// Sunday = 0 … Saturday = 6.
    pub const fn index_from_sunday(&self) -> i64 {
        match self {
            Self::Sunday => 0,
            Self::Monday => 1,
            Self::Tuesday => 2,
            Self::Wednesday => 3,
            Self::Thursday => 4,
            Self::Friday => 5,
            Self::Saturday => 6,
        }
    }

    pub const fn is_school_day(&self) -> bool {
        !matches!(self, Self::Saturday | Self::Sunday)
    }
}

// ============================================================================
// Schedule input and normalized form
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct TimeSlotInput {
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub course_id: Option<CourseId>,
    pub teacher_id: Option<TeacherId>,
    pub classroom: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct DayScheduleInput {
    pub day: Weekday,
    #[serde(default)]
    pub slots: Vec<TimeSlotInput>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TimeSlot {
    pub start_time: ClockTime,
    pub end_time: ClockTime,
    pub course_id: CourseId,
    pub teacher_id: Option<TeacherId>,
    pub classroom: Option<String>,
}

impl TimeSlot {
    pub fn range(&self) -> TimeRange {
        TimeRange {
            start: self.start_time,
            end: self.end_time,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DaySchedule {
    pub day: Weekday,
    pub slots: Vec<TimeSlot>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    Empty,
    DuplicateDay(Weekday),
    MissingCourse(Weekday),
    MissingTime(Weekday),
    InvalidTime {
        day: Weekday,
        value: String,
    },
    InvertedTime {
        day: Weekday,
        range: String,
    },
    Overlap {
        day: Weekday,
        first: TimeRange,
        second: TimeRange,
    },
    TeacherClash {
        day: Weekday,
        range: TimeRange,
        teacher_id: TeacherId,
        timetable_id: TimetableId,
    },
    RoomClash {
        day: Weekday,
        range: TimeRange,
        classroom: String,
        timetable_id: TimetableId,
    },
}

impl ScheduleError {
    /// Clashes with other timetables are conflicts; everything else is
    /// a malformed schedule.
    pub fn is_clash(&self) -> bool {
        matches!(self, Self::TeacherClash { .. } | Self::RoomClash { .. })
    }
}

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "Schedule is required"),
            Self::DuplicateDay(day) => write!(f, "Schedule lists {} more than once", day),
            Self::MissingCourse(day) => write!(f, "Course ID is required for {}", day),
            Self::MissingTime(day) => write!(f, "Time is required for {}", day),
            Self::InvalidTime { day, value } => {
                write!(f, "Invalid time '{}' for {}, expected HH:MM", value, day)
            }
            Self::InvertedTime { day, range } => {
                write!(f, "Start time must be before end time for {} ({})", day, range)
            }
            Self::Overlap { day, first, second } => {
                write!(f, "Slots {} and {} overlap on {}", first, second, day)
            }
            Self::TeacherClash {
                day,
                range,
                teacher_id,
                timetable_id,
            } => write!(
                f,
                "Teacher {} is already scheduled on {} {} in timetable {}",
                teacher_id, day, range, timetable_id
            ),
            Self::RoomClash {
                day,
                range,
                classroom,
                timetable_id,
            } => write!(
                f,
                "Classroom '{}' is already booked on {} {} in timetable {}",
                classroom, day, range, timetable_id
            ),
        }
    }
}

impl std::error::Error for ScheduleError {}

fn parse_time(day: Weekday, raw: &str) -> Result<ClockTime, ScheduleError> {
    raw.trim().parse().map_err(|_| ScheduleError::InvalidTime {
        day,
        value: raw.to_string(),
    })
}

/// Checks every slot and returns the schedule with each day's slots sorted by
/// start time. Days keep their input order.
pub fn normalize_schedule(input: &[DayScheduleInput]) -> Result<Vec<DaySchedule>, ScheduleError> {
    if input.is_empty() {
        return Err(ScheduleError::Empty);
    }

    let mut seen_days = HashSet::new();
    let mut schedule = Vec::with_capacity(input.len());

    for day_input in input {
        let day = day_input.day;
        if !seen_days.insert(day) {
            return Err(ScheduleError::DuplicateDay(day));
        }

        let mut slots = Vec::with_capacity(day_input.slots.len());
        for slot in &day_input.slots {
            let course_id = slot.course_id.ok_or(ScheduleError::MissingCourse(day))?;
            let (Some(start), Some(end)) = (
                slot.start_time.as_deref().filter(|s| !s.trim().is_empty()),
                slot.end_time.as_deref().filter(|s| !s.trim().is_empty()),
            ) else {
                return Err(ScheduleError::MissingTime(day));
            };

            let start_time = parse_time(day, start)?;
            let end_time = parse_time(day, end)?;
            if start_time >= end_time {
                return Err(ScheduleError::InvertedTime {
                    day,
                    range: format!("{}-{}", start_time, end_time),
                });
            }

            slots.push(TimeSlot {
                start_time,
                end_time,
                course_id,
                teacher_id: slot.teacher_id,
                classroom: slot
                    .classroom
                    .as_deref()
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(str::to_string),
            });
        }

        slots.sort_by_key(|s| s.start_time);
        for pair in slots.windows(2) {
            if pair[0].range().overlaps(&pair[1].range()) {
                return Err(ScheduleError::Overlap {
                    day,
                    first: pair[0].range(),
                    second: pair[1].range(),
                });
            }
        }

        schedule.push(DaySchedule { day, slots });
    }

    Ok(schedule)
}

/// Every course referenced by the schedule, deduplicated.
pub fn course_ids(schedule: &[DaySchedule]) -> Vec<CourseId> {
    let mut seen = HashSet::new();
    schedule
        .iter()
        .flat_map(|d| d.slots.iter().map(|s| s.course_id))
        .filter(|id| seen.insert(*id))
        .collect()
}

fn same_room(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

/// First teacher or classroom double-booking between `schedule` and any of
/// `others` (timetables of the same semester, excluding the one being saved).
pub fn find_clash(
    schedule: &[DaySchedule],
    others: &[(TimetableId, Vec<DaySchedule>)],
) -> Option<ScheduleError> {
    for day in schedule {
        for slot in &day.slots {
            for (other_id, other_schedule) in others {
                let other_slots = other_schedule
                    .iter()
                    .filter(|d| d.day == day.day)
                    .flat_map(|d| d.slots.iter());

                for other in other_slots {
                    if !slot.range().overlaps(&other.range()) {
                        continue;
                    }
                    if let (Some(a), Some(b)) = (slot.teacher_id, other.teacher_id)
                        && a == b
                    {
                        return Some(ScheduleError::TeacherClash {
                            day: day.day,
                            range: slot.range(),
                            teacher_id: a,
                            timetable_id: *other_id,
                        });
                    }
                    if let (Some(a), Some(b)) = (&slot.classroom, &other.classroom)
                        && same_room(a, b)
                    {
                        return Some(ScheduleError::RoomClash {
                            day: day.day,
                            range: slot.range(),
                            classroom: a.clone(),
                            timetable_id: *other_id,
                        });
                    }
                }
            }
        }
    }
    None
}

// ============================================================================
// Entities and DTOs
// ============================================================================

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Timetable {
    pub id: TimetableId,
    pub department_id: DepartmentId,
    pub program_id: ProgramId,
    pub level: StudentLevel,
    pub semester: String,
    #[schema(value_type = Vec<DaySchedule>)]
    pub schedule: Json<Vec<DaySchedule>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create or fully replace a timetable.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct TimetableDto {
    pub department_id: DepartmentId,
    pub program_id: ProgramId,
    pub level: StudentLevel,
    #[validate(length(min = 1, max = 50, message = "Semester is required"))]
    pub semester: String,
    pub schedule: Vec<DayScheduleInput>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TimetableLookupParams {
    pub department_id: DepartmentId,
    pub program_id: ProgramId,
    pub level: StudentLevel,
    pub semester: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CalendarParams {
    /// Any date in the week to project onto. Defaults to today.
    pub week_of: Option<NaiveDate>,
}

/// One class on a concrete date.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CalendarEntry {
    pub id: String,
    pub title: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub resource: String,
    pub course_id: CourseId,
    pub teacher_id: Option<TeacherId>,
}

/// Lays the Monday–Friday part of `schedule` onto the week containing
/// `reference` (weeks start on Sunday). Unknown courses get the title
/// "Unknown Course".
pub fn project_week(
    timetable_id: TimetableId,
    schedule: &[DaySchedule],
    course_codes: &HashMap<CourseId, String>,
    reference: NaiveDate,
) -> Vec<CalendarEntry> {
    let reference_index = i64::from(reference.weekday().num_days_from_sunday());

    schedule
        .iter()
        .filter(|day| day.day.is_school_day())
        .flat_map(|day| {
            let date = reference + Duration::days(day.day.index_from_sunday() - reference_index);
            day.slots.iter().map(move |slot| CalendarEntry {
                id: format!("{}-{}-{}", timetable_id, day.day, slot.start_time),
                title: course_codes
                    .get(&slot.course_id)
                    .cloned()
                    .unwrap_or_else(|| "Unknown Course".to_string()),
                start: slot.start_time.on(date),
                end: slot.end_time.on(date),
                resource: slot
                    .classroom
                    .clone()
                    .unwrap_or_else(|| "No Room".to_string()),
                course_id: slot.course_id,
                teacher_id: slot.teacher_id,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input_slot(start: &str, end: &str, course: CourseId) -> TimeSlotInput {
        TimeSlotInput {
            start_time: Some(start.to_string()),
            end_time: Some(end.to_string()),
            course_id: Some(course),
            teacher_id: None,
            classroom: None,
        }
    }

    fn day(day: Weekday, slots: Vec<TimeSlotInput>) -> DayScheduleInput {
        DayScheduleInput { day, slots }
    }

    #[test]
    fn test_empty_schedule_is_rejected() {
        assert_eq!(normalize_schedule(&[]), Err(ScheduleError::Empty));
    }

    #[test]
    fn test_missing_course_names_the_day() {
        let mut slot = input_slot("09:00", "10:00", CourseId::new());
        slot.course_id = None;
        let err = normalize_schedule(&[day(Weekday::Tuesday, vec![slot])]).unwrap_err();
        assert_eq!(err.to_string(), "Course ID is required for Tuesday");
    }

    #[test]
    fn test_missing_time_names_the_day() {
        let mut slot = input_slot("09:00", "10:00", CourseId::new());
        slot.end_time = Some("  ".to_string());
        let err = normalize_schedule(&[day(Weekday::Monday, vec![slot])]).unwrap_err();
        assert_eq!(err.to_string(), "Time is required for Monday");
    }

    #[test]
    fn test_invalid_and_inverted_times() {
        let c = CourseId::new();
        let err = normalize_schedule(&[day(Weekday::Monday, vec![input_slot("9am", "10:00", c)])])
            .unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidTime { .. }));

        let err = normalize_schedule(&[day(Weekday::Monday, vec![input_slot("11:00", "10:00", c)])])
            .unwrap_err();
        assert!(matches!(err, ScheduleError::InvertedTime { .. }));
    }

    #[test]
    fn test_overlapping_slots_are_rejected() {
        let c = CourseId::new();
        let err = normalize_schedule(&[day(
            Weekday::Monday,
            vec![input_slot("10:00", "12:00", c), input_slot("09:00", "10:30", c)],
        )])
        .unwrap_err();
        assert!(matches!(err, ScheduleError::Overlap { day: Weekday::Monday, .. }));
    }

    #[test]
    fn test_back_to_back_slots_are_sorted() {
        let (a, b) = (CourseId::new(), CourseId::new());
        let schedule = normalize_schedule(&[day(
            Weekday::Monday,
            vec![input_slot("10:00", "11:00", b), input_slot("09:00", "10:00", a)],
        )])
        .unwrap();
        assert_eq!(schedule[0].slots[0].course_id, a);
        assert_eq!(schedule[0].slots[1].course_id, b);
        assert_eq!(course_ids(&schedule), vec![a, b]);
    }

    #[test]
    fn test_duplicate_day_is_rejected() {
        let err = normalize_schedule(&[day(Weekday::Friday, vec![]), day(Weekday::Friday, vec![])])
            .unwrap_err();
        assert_eq!(err, ScheduleError::DuplicateDay(Weekday::Friday));
    }

    fn normalized(slots: Vec<TimeSlotInput>) -> Vec<DaySchedule> {
        normalize_schedule(&[day(Weekday::Wednesday, slots)]).unwrap()
    }

    #[test]
    fn test_teacher_clash_across_timetables() {
        let teacher = TeacherId::new();
        let mut mine = input_slot("09:00", "11:00", CourseId::new());
        mine.teacher_id = Some(teacher);
        let mut theirs = input_slot("10:00", "12:00", CourseId::new());
        theirs.teacher_id = Some(teacher);

        let other_id = TimetableId::new();
        let clash = find_clash(&normalized(vec![mine]), &[(other_id, normalized(vec![theirs]))]);
        assert!(matches!(
            clash,
            Some(ScheduleError::TeacherClash { timetable_id, .. }) if timetable_id == other_id
        ));
    }

    #[test]
    fn test_room_clash_is_case_insensitive() {
        let mut mine = input_slot("09:00", "11:00", CourseId::new());
        mine.classroom = Some("Lab A".to_string());
        let mut theirs = input_slot("10:30", "12:00", CourseId::new());
        theirs.classroom = Some("lab a".to_string());

        let clash = find_clash(
            &normalized(vec![mine]),
            &[(TimetableId::new(), normalized(vec![theirs]))],
        );
        assert!(clash.is_some_and(|c| c.is_clash()));
    }

    #[test]
    fn test_no_clash_when_times_do_not_overlap() {
        let teacher = TeacherId::new();
        let mut mine = input_slot("09:00", "10:00", CourseId::new());
        mine.teacher_id = Some(teacher);
        let mut theirs = input_slot("10:00", "11:00", CourseId::new());
        theirs.teacher_id = Some(teacher);

        assert!(
            find_clash(
                &normalized(vec![mine]),
                &[(TimetableId::new(), normalized(vec![theirs]))]
            )
            .is_none()
        );
    }

    #[test]
    fn test_project_week_uses_sunday_based_offsets() {
        let timetable_id = TimetableId::new();
        let course = CourseId::new();
        let mut slot = input_slot("09:00", "10:00", course);
        slot.classroom = Some("Hall 1".to_string());
        let schedule = normalize_schedule(&[
            day(Weekday::Monday, vec![slot]),
            day(Weekday::Friday, vec![input_slot("13:00", "14:00", CourseId::new())]),
            day(Weekday::Saturday, vec![input_slot("09:00", "10:00", course)]),
        ])
        .unwrap();
        let codes = HashMap::from([(course, "ANA101".to_string())]);

        // Wednesday 2025-03-12.
        let reference = NaiveDate::from_ymd_opt(2025, 3, 12).unwrap();
        let entries = project_week(timetable_id, &schedule, &codes, reference);

        assert_eq!(entries.len(), 2);
        let monday = &entries[0];
        assert_eq!(monday.start.date(), NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());
        assert_eq!(monday.id, format!("{}-Monday-09:00", timetable_id));
        assert_eq!(monday.title, "ANA101");
        assert_eq!(monday.resource, "Hall 1");

        let friday = &entries[1];
        assert_eq!(friday.start.date(), NaiveDate::from_ymd_opt(2025, 3, 14).unwrap());
        assert_eq!(friday.title, "Unknown Course");
        assert_eq!(friday.resource, "No Room");
    }

    #[test]
    fn test_project_week_from_sunday_reference() {
        let course = CourseId::new();
        let schedule =
            normalize_schedule(&[day(Weekday::Monday, vec![input_slot("08:00", "09:00", course)])])
                .unwrap();
        let sunday = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        let entries = project_week(TimetableId::new(), &schedule, &HashMap::new(), sunday);
        assert_eq!(entries[0].start.date(), NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());
    }
}
