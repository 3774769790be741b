use std::collections::HashMap;

use chrono::{Local, NaiveDate};
use registrar_core::AppError;
use registrar_models::{CourseId, TeacherId, TimetableId};
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};
use tracing::{info, instrument, warn};

use crate::metrics::track_schedule_conflict;
use crate::modules::programs::service::ProgramService;
use crate::modules::timetables::model::{
    CalendarEntry, DaySchedule, ScheduleError, Timetable, TimetableDto, TimetableLookupParams,
    course_ids, find_clash, normalize_schedule, project_week,
};
use crate::utils::references::{Referenced, ensure_all_exist, ensure_exists};

const TIMETABLE_COLUMNS: &str =
    "id, department_id, program_id, level, semester, schedule, created_at, updated_at";

fn schedule_error(e: ScheduleError) -> AppError {
    match &e {
        ScheduleError::TeacherClash { .. } => track_schedule_conflict("teacher"),
        ScheduleError::RoomClash { .. } => track_schedule_conflict("classroom"),
        _ => {}
    }
    if e.is_clash() {
        AppError::conflict(e)
    } else {
        AppError::unprocessable(e)
    }
}

fn map_duplicate(e: sqlx::Error) -> AppError {
    AppError::from_unique_violation(
        e,
        "A timetable already exists for this department, program, level and semester",
    )
}

pub struct TimetableService;

impl TimetableService {
    #[instrument(skip(db))]
    pub async fn list_timetables(db: &PgPool) -> Result<Vec<Timetable>, AppError> {
        let timetables = sqlx::query_as::<_, Timetable>(&format!(
            "SELECT {} FROM timetables ORDER BY semester, level, created_at",
            TIMETABLE_COLUMNS
        ))
        .fetch_all(db)
        .await?;
        Ok(timetables)
    }

    #[instrument(skip(db))]
    pub async fn get_timetable(db: &PgPool, id: TimetableId) -> Result<Timetable, AppError> {
        sqlx::query_as::<_, Timetable>(&format!(
            "SELECT {} FROM timetables WHERE id = $1",
            TIMETABLE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Timetable not found")))
    }

    #[instrument(skip(db))]
    pub async fn find_timetable(
        db: &PgPool,
        params: TimetableLookupParams,
    ) -> Result<Timetable, AppError> {
        sqlx::query_as::<_, Timetable>(&format!(
            "SELECT {} FROM timetables
             WHERE department_id = $1 AND program_id = $2 AND level = $3 AND semester = $4",
            TIMETABLE_COLUMNS
        ))
        .bind(params.department_id)
        .bind(params.program_id)
        .bind(params.level)
        .bind(params.semester.trim())
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Timetable not found")))
    }

    #[instrument(skip(db, dto), fields(program_id = %dto.program_id, semester = %dto.semester))]
    pub async fn create_timetable(db: &PgPool, dto: TimetableDto) -> Result<Timetable, AppError> {
        let mut tx = db.begin().await?;

        let schedule = Self::checked_schedule(&mut tx, &dto, None).await?;

        let timetable = sqlx::query_as::<_, Timetable>(&format!(
            "INSERT INTO timetables (department_id, program_id, level, semester, schedule)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {}",
            TIMETABLE_COLUMNS
        ))
        .bind(dto.department_id)
        .bind(dto.program_id)
        .bind(dto.level)
        .bind(dto.semester.trim())
        .bind(Json(&schedule))
        .fetch_one(&mut *tx)
        .await
        .map_err(map_duplicate)?;

        tx.commit().await?;

        info!(timetable_id = %timetable.id, "Timetable created");
        Ok(timetable)
    }

    /// Replaces every field of the timetable, schedule included.
    #[instrument(skip(db, dto))]
    pub async fn update_timetable(
        db: &PgPool,
        id: TimetableId,
        dto: TimetableDto,
    ) -> Result<Timetable, AppError> {
        let mut tx = db.begin().await?;

        sqlx::query("SELECT id FROM timetables WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Timetable not found")))?;

        let schedule = Self::checked_schedule(&mut tx, &dto, Some(id)).await?;

        let timetable = sqlx::query_as::<_, Timetable>(&format!(
            "UPDATE timetables
             SET department_id = $2, program_id = $3, level = $4, semester = $5, schedule = $6,
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {}",
            TIMETABLE_COLUMNS
        ))
        .bind(id)
        .bind(dto.department_id)
        .bind(dto.program_id)
        .bind(dto.level)
        .bind(dto.semester.trim())
        .bind(Json(&schedule))
        .fetch_one(&mut *tx)
        .await
        .map_err(map_duplicate)?;

        tx.commit().await?;
        Ok(timetable)
    }

    #[instrument(skip(db))]
    pub async fn delete_timetable(db: &PgPool, id: TimetableId) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM timetables WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("Timetable not found")));
        }
        Ok(())
    }

    /// The timetable's Monday–Friday classes on the week containing
    /// `week_of` (today when absent).
    #[instrument(skip(db))]
    pub async fn calendar(
        db: &PgPool,
        id: TimetableId,
        week_of: Option<NaiveDate>,
    ) -> Result<Vec<CalendarEntry>, AppError> {
        let timetable = Self::get_timetable(db, id).await?;
        let ids = course_ids(&timetable.schedule);

        let codes: HashMap<CourseId, String> = sqlx::query_as::<_, (CourseId, String)>(
            "SELECT id, code FROM courses WHERE id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(db)
        .await?
        .into_iter()
        .collect();

        let reference = week_of.unwrap_or_else(|| Local::now().date_naive());
        Ok(project_week(timetable.id, &timetable.schedule, &codes, reference))
    }

    /// Normalizes the schedule and checks it against the catalog and the
    /// other timetables of the semester.
    async fn checked_schedule(
        conn: &mut PgConnection,
        dto: &TimetableDto,
        exclude: Option<TimetableId>,
    ) -> Result<Vec<DaySchedule>, AppError> {
        let schedule = normalize_schedule(&dto.schedule).map_err(schedule_error)?;

        ensure_exists(conn, Referenced::Department, dto.department_id).await?;
        let program = ProgramService::lock_program(conn, dto.program_id).await?;
        if program.department_id != dto.department_id {
            return Err(AppError::unprocessable(anyhow::anyhow!(
                "Program does not belong to the given department"
            )));
        }

        ensure_all_exist(conn, Referenced::Course, &course_ids(&schedule)).await?;
        let teacher_ids: Vec<TeacherId> = schedule
            .iter()
            .flat_map(|day| day.slots.iter().filter_map(|slot| slot.teacher_id))
            .collect();
        ensure_all_exist(conn, Referenced::Teacher, &teacher_ids).await?;

        let others = sqlx::query_as::<_, (TimetableId, Json<Vec<DaySchedule>>)>(
            "SELECT id, schedule FROM timetables
             WHERE semester = $1 AND ($2::uuid IS NULL OR id <> $2)",
        )
        .bind(dto.semester.trim())
        .bind(exclude)
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .map(|(id, schedule)| (id, schedule.0))
        .collect::<Vec<_>>();

        if let Some(clash) = find_clash(&schedule, &others) {
            warn!(error = %clash, "Timetable clashes with another timetable");
            return Err(schedule_error(clash));
        }

        Ok(schedule)
    }
}
