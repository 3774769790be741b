use registrar_core::AppError;
use registrar_models::{CourseId, ProgramId, TeacherId};
use sqlx::{PgConnection, PgPool};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::modules::courses::model::{
    Course, CourseFilterParams, CreateCourseDto, IdDiff, UpdateCourseDto, check_program_links,
    diff_ids,
};
use crate::utils::references::{Referenced, ensure_all_exist};

/// Course columns with both link sets aggregated from the join tables.
const COURSE_SELECT: &str = r#"
    SELECT c.id, c.name, c.code, c.credit_unit, c.semester, c.is_general,
           COALESCE((SELECT array_agg(cp.program_id ORDER BY cp.program_id)
                     FROM course_programs cp WHERE cp.course_id = c.id), '{}'::uuid[]) AS program_ids,
           COALESCE((SELECT array_agg(ct.teacher_id ORDER BY ct.teacher_id)
                     FROM course_teachers ct WHERE ct.course_id = c.id), '{}'::uuid[]) AS teacher_ids,
           c.created_at, c.updated_at
    FROM courses c"#;

/// A join table between courses and another entity.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LinkTable {
    pub table: &'static str,
    pub owner_column: &'static str,
    pub other_column: &'static str,
}

pub(crate) const COURSE_PROGRAMS: LinkTable = LinkTable {
    table: "course_programs",
    owner_column: "course_id",
    other_column: "program_id",
};

pub(crate) const COURSE_TEACHERS: LinkTable = LinkTable {
    table: "course_teachers",
    owner_column: "course_id",
    other_column: "teacher_id",
};

pub(crate) const TEACHER_COURSES: LinkTable = LinkTable {
    table: "course_teachers",
    owner_column: "teacher_id",
    other_column: "course_id",
};

/// Applies an id diff to a join table: removed links are deleted, added
/// links inserted.
pub(crate) async fn apply_link_diff<T>(
    conn: &mut PgConnection,
    links: LinkTable,
    owner: Uuid,
    diff: &IdDiff<T>,
) -> Result<(), AppError>
where
    T: Copy + Into<Uuid>,
{
    if !diff.removed.is_empty() {
        let removed: Vec<Uuid> = diff.removed.iter().copied().map(Into::into).collect();
        sqlx::query(&format!(
            "DELETE FROM {} WHERE {} = $1 AND {} = ANY($2)",
            links.table, links.owner_column, links.other_column
        ))
        .bind(owner)
        .bind(&removed)
        .execute(&mut *conn)
        .await?;
    }

    if !diff.added.is_empty() {
        let added: Vec<Uuid> = diff.added.iter().copied().map(Into::into).collect();
        sqlx::query(&format!(
            "INSERT INTO {} ({}, {}) SELECT $1, UNNEST($2::uuid[]) ON CONFLICT DO NOTHING",
            links.table, links.owner_column, links.other_column
        ))
        .bind(owner)
        .bind(&added)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

pub struct CourseService;

impl CourseService {
    /// Lists courses. A program filter includes general courses, which are
    /// offered to every program.
    #[instrument(skip(db))]
    pub async fn list_courses(
        db: &PgPool,
        filters: CourseFilterParams,
    ) -> Result<Vec<Course>, AppError> {
        let courses = sqlx::query_as::<_, Course>(&format!(
            r#"{}
            WHERE ($1::uuid IS NULL OR c.is_general
                   OR EXISTS (SELECT 1 FROM course_programs cp
                              WHERE cp.course_id = c.id AND cp.program_id = $1))
              AND ($2::uuid IS NULL
                   OR EXISTS (SELECT 1 FROM course_teachers ct
                              WHERE ct.course_id = c.id AND ct.teacher_id = $2))
              AND ($3::text IS NULL OR c.semester = $3)
            ORDER BY c.code"#,
            COURSE_SELECT
        ))
        .bind(filters.program_id)
        .bind(filters.teacher_id)
        .bind(filters.semester)
        .fetch_all(db)
        .await?;

        Ok(courses)
    }

    #[instrument(skip(db))]
    pub async fn list_program_courses(
        db: &PgPool,
        program_id: ProgramId,
    ) -> Result<Vec<Course>, AppError> {
        Self::list_courses(
            db,
            CourseFilterParams {
                program_id: Some(program_id),
                ..Default::default()
            },
        )
        .await
    }

    #[instrument(skip(db))]
    pub async fn list_teacher_courses(
        db: &PgPool,
        teacher_id: TeacherId,
    ) -> Result<Vec<Course>, AppError> {
        Self::list_courses(
            db,
            CourseFilterParams {
                teacher_id: Some(teacher_id),
                ..Default::default()
            },
        )
        .await
    }

    #[instrument(skip(db))]
    pub async fn get_course(db: &PgPool, id: CourseId) -> Result<Course, AppError> {
        Self::fetch_course(&mut *db.acquire().await?, id).await
    }

    async fn fetch_course(conn: &mut PgConnection, id: CourseId) -> Result<Course, AppError> {
        sqlx::query_as::<_, Course>(&format!("{} WHERE c.id = $1", COURSE_SELECT))
            .bind(id)
            .fetch_optional(conn)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Course not found")))
    }

    /// Creates the course and links it to its programs and teachers.
    #[instrument(skip(db))]
    pub async fn create_course(db: &PgPool, dto: CreateCourseDto) -> Result<Course, AppError> {
        let mut tx = db.begin().await?;

        ensure_all_exist(&mut tx, Referenced::Program, &dto.program_ids).await?;
        ensure_all_exist(&mut tx, Referenced::Teacher, &dto.teacher_ids).await?;

        let id = sqlx::query_scalar::<_, CourseId>(
            r#"INSERT INTO courses (name, code, credit_unit, semester, is_general)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING id"#,
        )
        .bind(dto.name.trim())
        .bind(dto.code.trim())
        .bind(dto.credit_unit)
        .bind(dto.semester.trim())
        .bind(dto.is_general)
        .fetch_one(&mut *tx)
        .await?;

        apply_link_diff(&mut tx, COURSE_PROGRAMS, id.into(), &diff_ids(&[], &dto.program_ids))
            .await?;
        apply_link_diff(&mut tx, COURSE_TEACHERS, id.into(), &diff_ids(&[], &dto.teacher_ids))
            .await?;

        let course = Self::fetch_course(&mut tx, id).await?;
        tx.commit().await?;

        info!(course_id = %course.id, code = %course.code, "Course created");
        Ok(course)
    }

    /// Updates scalar fields and reconciles program and teacher links
    /// against the stored sets.
    #[instrument(skip(db))]
    pub async fn update_course(
        db: &PgPool,
        id: CourseId,
        dto: UpdateCourseDto,
    ) -> Result<Course, AppError> {
        let mut tx = db.begin().await?;

        sqlx::query("SELECT id FROM courses WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Course not found")))?;
        let current = Self::fetch_course(&mut tx, id).await?;

        let is_general = dto.is_general.unwrap_or(current.is_general);
        let program_ids = if is_general {
            Vec::new()
        } else {
            dto.program_ids
                .clone()
                .unwrap_or_else(|| current.program_ids.clone())
        };
        check_program_links(is_general, &program_ids)
            .map_err(|e| AppError::unprocessable(anyhow::anyhow!("{}", e)))?;

        let teacher_ids = dto
            .teacher_ids
            .clone()
            .unwrap_or_else(|| current.teacher_ids.clone());

        ensure_all_exist(&mut tx, Referenced::Program, &program_ids).await?;
        ensure_all_exist(&mut tx, Referenced::Teacher, &teacher_ids).await?;

        sqlx::query(
            r#"UPDATE courses
               SET name = COALESCE($2, name),
                   code = COALESCE($3, code),
                   credit_unit = COALESCE($4, credit_unit),
                   semester = COALESCE($5, semester),
                   is_general = $6,
                   updated_at = NOW()
               WHERE id = $1"#,
        )
        .bind(id)
        .bind(dto.name.as_deref().map(str::trim))
        .bind(dto.code.as_deref().map(str::trim))
        .bind(dto.credit_unit)
        .bind(dto.semester.as_deref().map(str::trim))
        .bind(is_general)
        .execute(&mut *tx)
        .await?;

        apply_link_diff(
            &mut tx,
            COURSE_PROGRAMS,
            id.into(),
            &diff_ids(&current.program_ids, &program_ids),
        )
        .await?;
        apply_link_diff(
            &mut tx,
            COURSE_TEACHERS,
            id.into(),
            &diff_ids(&current.teacher_ids, &teacher_ids),
        )
        .await?;

        let course = Self::fetch_course(&mut tx, id).await?;
        tx.commit().await?;

        Ok(course)
    }

    /// Deletes the course. Program and teacher links go with it; a course
    /// with recorded results is refused, since CGPA depends on its credit unit.
    #[instrument(skip(db))]
    pub async fn delete_course(db: &PgPool, id: CourseId) -> Result<(), AppError> {
        let has_results = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM results WHERE course_id = $1)",
        )
        .bind(id)
        .fetch_one(db)
        .await?;
        if has_results {
            return Err(AppError::conflict(anyhow::anyhow!(
                "Course has recorded results and cannot be deleted"
            )));
        }

        let result = sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e
                    && db_err.is_foreign_key_violation()
                {
                    return AppError::conflict(anyhow::anyhow!(
                        "Course has recorded results and cannot be deleted"
                    ));
                }
                AppError::from(e)
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("Course not found")));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::students::service::test_support::insert_applicant;
    use axum::http::StatusCode;
    use registrar_models::DepartmentId;

    async fn program(pool: &PgPool, name: &str) -> ProgramId {
        let department: DepartmentId =
            sqlx::query_scalar("INSERT INTO departments (name) VALUES ($1) RETURNING id")
                .bind(format!("{} Department", name))
                .fetch_one(pool)
                .await
                .unwrap();
        sqlx::query_scalar("INSERT INTO programs (department_id, name) VALUES ($1, $2) RETURNING id")
            .bind(department)
            .bind(name)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    async fn teacher(pool: &PgPool, email: &str) -> TeacherId {
        sqlx::query_scalar(
            r#"INSERT INTO teachers (name, email, phone, sex, staff_number)
               VALUES ('Test Teacher', $1, '0800', 'female', 'T-1')
               RETURNING id"#,
        )
        .bind(email)
        .fetch_one(pool)
        .await
        .unwrap()
    }

    fn dto(code: &str, is_general: bool, program_ids: Vec<ProgramId>) -> CreateCourseDto {
        CreateCourseDto {
            name: format!("Course {}", code),
            code: code.to_string(),
            credit_unit: 3,
            semester: "First".to_string(),
            is_general,
            program_ids,
            teacher_ids: vec![],
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_general_courses_visible_to_every_program(pool: PgPool) {
        let p1 = program(&pool, "Nursing").await;
        let p2 = program(&pool, "Pharmacy").await;

        CourseService::create_course(&pool, dto("GST101", true, vec![]))
            .await
            .unwrap();
        CourseService::create_course(&pool, dto("NUR101", false, vec![p1]))
            .await
            .unwrap();

        let for_p1: Vec<String> = CourseService::list_program_courses(&pool, p1)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.code)
            .collect();
        assert_eq!(for_p1, vec!["GST101", "NUR101"]);

        let for_p2: Vec<String> = CourseService::list_program_courses(&pool, p2)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.code)
            .collect();
        assert_eq!(for_p2, vec!["GST101"]);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_update_reconciles_teacher_links(pool: PgPool) {
        let p = program(&pool, "Nursing").await;
        let t1 = teacher(&pool, "one@example.com").await;
        let t2 = teacher(&pool, "two@example.com").await;

        let mut create = dto("NUR201", false, vec![p]);
        create.teacher_ids = vec![t1];
        let course = CourseService::create_course(&pool, create).await.unwrap();
        assert_eq!(course.teacher_ids, vec![t1]);

        let updated = CourseService::update_course(
            &pool,
            course.id,
            UpdateCourseDto {
                name: None,
                code: None,
                credit_unit: Some(4),
                semester: None,
                is_general: None,
                program_ids: None,
                teacher_ids: Some(vec![t2]),
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.teacher_ids, vec![t2]);
        assert_eq!(updated.credit_unit, 4);
        assert_eq!(updated.program_ids, vec![p]);

        let t1_courses = CourseService::list_teacher_courses(&pool, t1).await.unwrap();
        assert!(t1_courses.is_empty());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_switching_to_general_drops_programs(pool: PgPool) {
        let p = program(&pool, "Nursing").await;
        let course = CourseService::create_course(&pool, dto("GST102", false, vec![p]))
            .await
            .unwrap();

        let updated = CourseService::update_course(
            &pool,
            course.id,
            UpdateCourseDto {
                name: None,
                code: None,
                credit_unit: None,
                semester: None,
                is_general: Some(true),
                program_ids: None,
                teacher_ids: None,
            },
        )
        .await
        .unwrap();
        assert!(updated.is_general);
        assert!(updated.program_ids.is_empty());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_unknown_program_is_not_found(pool: PgPool) {
        let result =
            CourseService::create_course(&pool, dto("BAD101", false, vec![ProgramId::new()]))
                .await;
        assert_eq!(result.unwrap_err().status, StatusCode::NOT_FOUND);

        let missing = CourseService::delete_course(&pool, CourseId::new()).await;
        assert_eq!(missing.unwrap_err().status, StatusCode::NOT_FOUND);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_course_with_results_cannot_be_deleted(pool: PgPool) {
        let course = CourseService::create_course(&pool, dto("GST104", true, vec![]))
            .await
            .unwrap();
        let student = insert_applicant(&pool, "kept@example.com", None, None).await;
        sqlx::query(
            "INSERT INTO results
                 (student_id, course_id, ca_mark, exam_mark, total_mark, grade, grade_point, semester)
             VALUES ($1, $2, 20, 40, 60, 'B', 4, 'First')",
        )
        .bind(student)
        .bind(course.id)
        .execute(&pool)
        .await
        .unwrap();

        let err = CourseService::delete_course(&pool, course.id).await.unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);
        assert!(CourseService::get_course(&pool, course.id).await.is_ok());
    }
}
