use registrar_core::{AppError, Paginated};
use registrar_models::{StudentId, TeacherId};
use sqlx::PgPool;
use tracing::{info, instrument};

use crate::metrics::track_result_recorded;
use crate::modules::results::model::{
    Assessment, Cgpa, CourseResult, RecordResultDto, ResultFilterParams, StudentResult,
    compute_cgpa,
};
use crate::utils::references::{Referenced, ensure_exists};
use crate::validator::validate_dto;

const RESULT_COLUMNS: &str = "id, student_id, course_id, teacher_id, ca_mark, exam_mark, \
                              total_mark, grade, grade_point, semester, created_at, updated_at";

const STUDENT_RESULT_SELECT: &str = r#"
    SELECT r.id, r.student_id, r.course_id, c.code AS course_code, c.name AS course_name,
           c.credit_unit, r.ca_mark, r.exam_mark, r.total_mark, r.grade, r.grade_point,
           r.semester
    FROM results r
    JOIN courses c ON c.id = r.course_id"#;

pub struct ResultService;

impl ResultService {
    /// Records or corrects a student's result for a course in a semester.
    /// A correction keeps the teacher who first entered the result.
    #[instrument(skip(db, dto), fields(student_id = %dto.student_id, course_id = %dto.course_id))]
    pub async fn record_result(
        db: &PgPool,
        teacher_id: TeacherId,
        dto: RecordResultDto,
    ) -> Result<CourseResult, AppError> {
        validate_dto(&dto)?;
        let semester = dto.semester.trim().to_string();

        let mut tx = db.begin().await?;

        ensure_exists(&mut tx, Referenced::Student, dto.student_id).await?;
        ensure_exists(&mut tx, Referenced::Teacher, teacher_id).await?;
        let credit_unit =
            sqlx::query_scalar::<_, i32>("SELECT credit_unit FROM courses WHERE id = $1")
                .bind(dto.course_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Course not found")))?;

        let assessment = Assessment::grade(dto.ca_mark, dto.exam_mark, credit_unit);

        let result = sqlx::query_as::<_, CourseResult>(&format!(
            r#"INSERT INTO results
                   (student_id, course_id, teacher_id, ca_mark, exam_mark, total_mark,
                    grade, grade_point, semester)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
               ON CONFLICT (student_id, course_id, semester) DO UPDATE
               SET teacher_id = COALESCE(results.teacher_id, EXCLUDED.teacher_id),
                   ca_mark = EXCLUDED.ca_mark,
                   exam_mark = EXCLUDED.exam_mark,
                   total_mark = EXCLUDED.total_mark,
                   grade = EXCLUDED.grade,
                   grade_point = EXCLUDED.grade_point,
                   updated_at = NOW()
               RETURNING {}"#,
            RESULT_COLUMNS
        ))
        .bind(dto.student_id)
        .bind(dto.course_id)
        .bind(teacher_id)
        .bind(dto.ca_mark)
        .bind(dto.exam_mark)
        .bind(assessment.total_mark)
        .bind(assessment.grade)
        .bind(assessment.grade_point)
        .bind(&semester)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            result_id = %result.id,
            grade = %result.grade,
            grade_point = result.grade_point,
            "Result recorded"
        );
        track_result_recorded(result.grade.as_str());

        Ok(result)
    }

    #[instrument(skip(db))]
    pub async fn list_student_results(
        db: &PgPool,
        student_id: StudentId,
        semester: Option<&str>,
    ) -> Result<Vec<StudentResult>, AppError> {
        let results = sqlx::query_as::<_, StudentResult>(&format!(
            "{}
             WHERE r.student_id = $1 AND ($2::text IS NULL OR r.semester = $2)
             ORDER BY r.semester, c.code",
            STUDENT_RESULT_SELECT
        ))
        .bind(student_id)
        .bind(semester.map(str::trim))
        .fetch_all(db)
        .await?;
        Ok(results)
    }

    /// Results entered by one teacher.
    #[instrument(skip(db))]
    pub async fn list_teacher_results(
        db: &PgPool,
        teacher_id: TeacherId,
    ) -> Result<Vec<StudentResult>, AppError> {
        let results = sqlx::query_as::<_, StudentResult>(&format!(
            "{} WHERE r.teacher_id = $1 ORDER BY r.updated_at DESC",
            STUDENT_RESULT_SELECT
        ))
        .bind(teacher_id)
        .fetch_all(db)
        .await?;
        Ok(results)
    }

    #[instrument(skip(db))]
    pub async fn list_results(
        db: &PgPool,
        filters: ResultFilterParams,
    ) -> Result<Paginated<StudentResult>, AppError> {
        let limit = filters.pagination.limit();
        let offset = filters.pagination.offset();
        let semester = filters.semester.as_deref().map(str::trim);

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM results r WHERE ($1::text IS NULL OR r.semester = $1)",
        )
        .bind(semester)
        .fetch_one(db)
        .await?;

        let results = sqlx::query_as::<_, StudentResult>(&format!(
            "{}
             WHERE ($1::text IS NULL OR r.semester = $1)
             ORDER BY r.created_at DESC
             LIMIT {} OFFSET {}",
            STUDENT_RESULT_SELECT, limit, offset
        ))
        .bind(semester)
        .fetch_all(db)
        .await?;

        Ok(Paginated::new(results, total, &filters.pagination))
    }

    /// Σ grade points / Σ credit units for one semester, or across every
    /// semester when none is given.
    #[instrument(skip(db))]
    pub async fn calculate_cgpa(
        db: &PgPool,
        student_id: StudentId,
        semester: Option<&str>,
    ) -> Result<Cgpa, AppError> {
        let semester = semester.map(str::trim);
        let (total_grade_points, total_credit_units) = sqlx::query_as::<_, (i64, i64)>(
            r#"SELECT COALESCE(SUM(r.grade_point), 0)::BIGINT,
                      COALESCE(SUM(c.credit_unit), 0)::BIGINT
               FROM results r
               JOIN courses c ON c.id = r.course_id
               WHERE r.student_id = $1 AND ($2::text IS NULL OR r.semester = $2)"#,
        )
        .bind(student_id)
        .bind(semester)
        .fetch_one(db)
        .await?;

        Ok(Cgpa {
            student_id,
            semester: semester.map(str::to_string),
            cgpa: compute_cgpa(total_grade_points, total_credit_units),
            total_grade_points,
            total_credit_units,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::results::model::Grade;
    use crate::modules::students::service::test_support::insert_applicant;
    use axum::http::StatusCode;
    use registrar_core::PaginationParams;
    use registrar_models::CourseId;

    async fn course(pool: &PgPool, code: &str, credit_unit: i32) -> CourseId {
        sqlx::query_scalar(
            "INSERT INTO courses (name, code, credit_unit, semester, is_general)
             VALUES ($1, $1, $2, 'First', TRUE) RETURNING id",
        )
        .bind(code)
        .bind(credit_unit)
        .fetch_one(pool)
        .await
        .unwrap()
    }

    async fn teacher(pool: &PgPool, email: &str) -> TeacherId {
        sqlx::query_scalar(
            "INSERT INTO teachers (name, email, phone, sex, staff_number)
             VALUES ('Musa Bello', $1, '0803', 'male', $1) RETURNING id",
        )
        .bind(email)
        .fetch_one(pool)
        .await
        .unwrap()
    }

    fn dto(student_id: StudentId, course_id: CourseId, ca: f64, exam: f64) -> RecordResultDto {
        RecordResultDto {
            student_id,
            course_id,
            teacher_id: None,
            ca_mark: ca,
            exam_mark: exam,
            semester: "First".to_string(),
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_record_grades_with_credit_weight(pool: PgPool) {
        let student = insert_applicant(&pool, "grade@example.com", None, None).await;
        let course_id = course(&pool, "NUR101", 3).await;
        let teacher_id = teacher(&pool, "musa@example.com").await;

        let result = ResultService::record_result(&pool, teacher_id, dto(student, course_id, 25.0, 47.0))
            .await
            .unwrap();

        assert_eq!(result.total_mark, 72.0);
        assert_eq!(result.grade, Grade::A);
        assert_eq!(result.grade_point, 15);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_resubmission_updates_in_place_and_keeps_teacher(pool: PgPool) {
        let student = insert_applicant(&pool, "again@example.com", None, None).await;
        let course_id = course(&pool, "NUR102", 2).await;
        let first_teacher = teacher(&pool, "first@example.com").await;
        let second_teacher = teacher(&pool, "second@example.com").await;

        let first = ResultService::record_result(&pool, first_teacher, dto(student, course_id, 20.0, 30.0))
            .await
            .unwrap();
        let second = ResultService::record_result(&pool, second_teacher, dto(student, course_id, 20.0, 30.0))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.teacher_id, Some(first_teacher));
        assert_eq!(second.grade, first.grade);
        assert_eq!(second.grade_point, first.grade_point);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM results")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_marks_out_of_range_are_unprocessable(pool: PgPool) {
        let student = insert_applicant(&pool, "range@example.com", None, None).await;
        let course_id = course(&pool, "NUR103", 2).await;
        let teacher_id = teacher(&pool, "range-t@example.com").await;

        let over = ResultService::record_result(&pool, teacher_id, dto(student, course_id, 50.0, 51.0)).await;
        assert_eq!(over.unwrap_err().status, StatusCode::UNPROCESSABLE_ENTITY);

        let negative =
            ResultService::record_result(&pool, teacher_id, dto(student, course_id, -1.0, 10.0)).await;
        assert_eq!(negative.unwrap_err().status, StatusCode::UNPROCESSABLE_ENTITY);

        let missing =
            ResultService::record_result(&pool, teacher_id, dto(student, CourseId::new(), 10.0, 10.0)).await;
        assert_eq!(missing.unwrap_err().status, StatusCode::NOT_FOUND);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_cgpa_per_semester_and_cumulative(pool: PgPool) {
        let student = insert_applicant(&pool, "cgpa@example.com", None, None).await;
        let teacher_id = teacher(&pool, "cgpa-t@example.com").await;
        let three = course(&pool, "NUR201", 3).await;
        let two = course(&pool, "NUR202", 2).await;

        let empty = ResultService::calculate_cgpa(&pool, student, None).await.unwrap();
        assert_eq!(empty.cgpa, 0.0);
        assert_eq!(empty.total_credit_units, 0);

        // A (5 × 3 = 15) and D (2 × 2 = 4) in the first semester.
        ResultService::record_result(&pool, teacher_id, dto(student, three, 30.0, 45.0))
            .await
            .unwrap();
        ResultService::record_result(&pool, teacher_id, dto(student, two, 20.0, 26.0))
            .await
            .unwrap();
        // B (4 × 3 = 12) in the second.
        let mut second = dto(student, three, 30.0, 32.0);
        second.semester = "Second".to_string();
        ResultService::record_result(&pool, teacher_id, second).await.unwrap();

        let first = ResultService::calculate_cgpa(&pool, student, Some("First")).await.unwrap();
        assert_eq!(first.total_grade_points, 19);
        assert_eq!(first.total_credit_units, 5);
        assert_eq!(first.cgpa, 3.8);

        let cumulative = ResultService::calculate_cgpa(&pool, student, None).await.unwrap();
        assert_eq!(cumulative.total_grade_points, 31);
        assert_eq!(cumulative.total_credit_units, 8);
        assert_eq!(cumulative.cgpa, 3.88);
        assert!(cumulative.semester.is_none());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_result_queries(pool: PgPool) {
        let student = insert_applicant(&pool, "query@example.com", None, None).await;
        let teacher_id = teacher(&pool, "query-t@example.com").await;
        let course_id = course(&pool, "NUR301", 4).await;

        ResultService::record_result(&pool, teacher_id, dto(student, course_id, 30.0, 40.0))
            .await
            .unwrap();

        let mine = ResultService::list_student_results(&pool, student, Some("First"))
            .await
            .unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].course_code, "NUR301");
        assert_eq!(mine[0].credit_unit, 4);

        let other_semester = ResultService::list_student_results(&pool, student, Some("Second"))
            .await
            .unwrap();
        assert!(other_semester.is_empty());

        let entered = ResultService::list_teacher_results(&pool, teacher_id).await.unwrap();
        assert_eq!(entered.len(), 1);

        let all = ResultService::list_results(
            &pool,
            ResultFilterParams {
                semester: None,
                pagination: PaginationParams::default(),
            },
        )
        .await
        .unwrap();
        assert_eq!(all.meta.total, 1);
        assert!(!all.meta.has_more);
    }
}
