use registrar_core::AppError;
use registrar_models::{ExamId, TeacherId};
use sqlx::{PgConnection, PgPool};
use tracing::{info, instrument, warn};
use validator::ValidationError;

use crate::metrics::track_schedule_conflict;
use crate::modules::exams::model::{
    CreateExamDto, ExamClash, ExamFilterParams, ExamTimetable, ExamTimetableDetails,
    UpdateExamDto, find_exam_clash,
};
use crate::utils::references::{Referenced, ensure_all_exist, ensure_exists};

const EXAM_COLUMNS: &str = "id, course_id, teacher_id, invigilator_id, exam_hall, date, \
                            start_time, end_time, semester, program_id, level_id, created_at";

const EXAM_DETAILS_SELECT: &str = r#"
    SELECT e.id, e.course_id, c.code AS course_code, c.name AS course_name,
           e.teacher_id, t.name AS teacher_name,
           e.invigilator_id, i.name AS invigilator_name,
           e.exam_hall, e.date, e.start_time, e.end_time, e.semester,
           e.program_id, e.level_id, l.name AS level_name, e.created_at
    FROM exam_timetables e
    JOIN courses c ON c.id = e.course_id
    JOIN teachers t ON t.id = e.teacher_id
    LEFT JOIN teachers i ON i.id = e.invigilator_id
    JOIN levels l ON l.id = e.level_id"#;

fn clash_error(clash: ExamClash) -> AppError {
    let kind = match clash {
        ExamClash::Hall { .. } => "exam_hall",
        ExamClash::Teacher { .. } => "exam_teacher",
        ExamClash::Invigilator { .. } => "exam_invigilator",
    };
    warn!(error = %clash, "Exam clashes with an existing entry");
    track_schedule_conflict(kind);
    AppError::conflict(clash)
}

fn invalid_times(e: ValidationError) -> AppError {
    let message = e
        .message
        .map(|m| m.to_string())
        .unwrap_or_else(|| e.code.to_string());
    AppError::unprocessable(anyhow::anyhow!(message))
}

pub struct ExamService;

impl ExamService {
    /// Optionally narrowed to one program and/or semester.
    #[instrument(skip(db))]
    pub async fn list_exams(
        db: &PgPool,
        filters: ExamFilterParams,
    ) -> Result<Vec<ExamTimetableDetails>, AppError> {
        let exams = sqlx::query_as::<_, ExamTimetableDetails>(&format!(
            "{}
             WHERE ($1::uuid IS NULL OR e.program_id = $1)
               AND ($2::text IS NULL OR e.semester = $2)
             ORDER BY e.date, e.start_time",
            EXAM_DETAILS_SELECT
        ))
        .bind(filters.program_id)
        .bind(filters.semester.as_deref().map(str::trim))
        .fetch_all(db)
        .await?;
        Ok(exams)
    }

    /// Exams the teacher sets or invigilates.
    #[instrument(skip(db))]
    pub async fn list_teacher_exams(
        db: &PgPool,
        teacher_id: TeacherId,
    ) -> Result<Vec<ExamTimetableDetails>, AppError> {
        let exams = sqlx::query_as::<_, ExamTimetableDetails>(&format!(
            "{} WHERE e.teacher_id = $1 OR e.invigilator_id = $1 ORDER BY e.date, e.start_time",
            EXAM_DETAILS_SELECT
        ))
        .bind(teacher_id)
        .fetch_all(db)
        .await?;
        Ok(exams)
    }

    #[instrument(skip(db))]
    pub async fn get_exam(db: &PgPool, id: ExamId) -> Result<ExamTimetableDetails, AppError> {
        sqlx::query_as::<_, ExamTimetableDetails>(&format!("{} WHERE e.id = $1", EXAM_DETAILS_SELECT))
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Exam not found")))
    }

    #[instrument(skip(db, dto), fields(course_id = %dto.course_id, date = %dto.date))]
    pub async fn create_exam(db: &PgPool, dto: CreateExamDto) -> Result<ExamTimetable, AppError> {
        let mut tx = db.begin().await?;

        let candidate = ExamTimetable {
            id: ExamId::new(),
            course_id: dto.course_id,
            teacher_id: dto.teacher_id,
            invigilator_id: dto.invigilator_id,
            exam_hall: dto.exam_hall.trim().to_string(),
            date: dto.date,
            start_time: dto.start_time,
            end_time: dto.end_time,
            semester: dto.semester.trim().to_string(),
            program_id: dto.program_id,
            level_id: dto.level_id,
            created_at: chrono::Utc::now(),
        };
        Self::check_exam(&mut tx, &candidate).await?;

        let exam = sqlx::query_as::<_, ExamTimetable>(&format!(
            "INSERT INTO exam_timetables
                 (id, course_id, teacher_id, invigilator_id, exam_hall, date, start_time,
                  end_time, semester, program_id, level_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             RETURNING {}",
            EXAM_COLUMNS
        ))
        .bind(candidate.id)
        .bind(candidate.course_id)
        .bind(candidate.teacher_id)
        .bind(candidate.invigilator_id)
        .bind(&candidate.exam_hall)
        .bind(candidate.date)
        .bind(candidate.start_time)
        .bind(candidate.end_time)
        .bind(&candidate.semester)
        .bind(candidate.program_id)
        .bind(candidate.level_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(exam_id = %exam.id, "Exam scheduled");
        Ok(exam)
    }

    /// Partial update; the merged entry is checked as a whole.
    #[instrument(skip(db, dto))]
    pub async fn update_exam(
        db: &PgPool,
        id: ExamId,
        dto: UpdateExamDto,
    ) -> Result<ExamTimetable, AppError> {
        let mut tx = db.begin().await?;

        let current = sqlx::query_as::<_, ExamTimetable>(&format!(
            "SELECT {} FROM exam_timetables WHERE id = $1 FOR UPDATE",
            EXAM_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Exam not found")))?;

        let mut updated = dto.apply_to(&current).map_err(invalid_times)?;
        updated.exam_hall = updated.exam_hall.trim().to_string();
        updated.semester = updated.semester.trim().to_string();
        Self::check_exam(&mut tx, &updated).await?;

        let exam = sqlx::query_as::<_, ExamTimetable>(&format!(
            "UPDATE exam_timetables
             SET course_id = $2, teacher_id = $3, invigilator_id = $4, exam_hall = $5,
                 date = $6, start_time = $7, end_time = $8, semester = $9,
                 program_id = $10, level_id = $11
             WHERE id = $1
             RETURNING {}",
            EXAM_COLUMNS
        ))
        .bind(id)
        .bind(updated.course_id)
        .bind(updated.teacher_id)
        .bind(updated.invigilator_id)
        .bind(&updated.exam_hall)
        .bind(updated.date)
        .bind(updated.start_time)
        .bind(updated.end_time)
        .bind(&updated.semester)
        .bind(updated.program_id)
        .bind(updated.level_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(exam)
    }

    #[instrument(skip(db))]
    pub async fn delete_exam(db: &PgPool, id: ExamId) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM exam_timetables WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("Exam not found")));
        }
        Ok(())
    }

    /// References must exist and the entry must not clash with another exam
    /// on the same date.
    async fn check_exam(conn: &mut PgConnection, exam: &ExamTimetable) -> Result<(), AppError> {
        ensure_exists(conn, Referenced::Course, exam.course_id).await?;
        let staff: Vec<TeacherId> = std::iter::once(exam.teacher_id)
            .chain(exam.invigilator_id)
            .collect();
        ensure_all_exist(conn, Referenced::Teacher, &staff).await?;
        ensure_exists(conn, Referenced::Program, exam.program_id).await?;
        ensure_exists(conn, Referenced::Level, exam.level_id).await?;

        let same_day = sqlx::query_as::<_, ExamTimetable>(&format!(
            "SELECT {} FROM exam_timetables WHERE date = $1 AND id <> $2 FOR UPDATE",
            EXAM_COLUMNS
        ))
        .bind(exam.date)
        .bind(exam.id)
        .fetch_all(&mut *conn)
        .await?;

        match find_exam_clash(exam, &same_day) {
            Some(clash) => Err(clash_error(clash)),
            None => Ok(()),
        }
    }
}
