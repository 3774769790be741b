use registrar_core::AppError;
use registrar_models::TeacherId;
use sqlx::{PgConnection, PgPool};
use tracing::{info, instrument};

use crate::modules::courses::model::diff_ids;
use crate::modules::courses::service::{TEACHER_COURSES, apply_link_diff};
use crate::modules::teachers::model::{CreateTeacherDto, Teacher, UpdateTeacherDto, full_name};
use crate::utils::references::{Referenced, ensure_all_exist, ensure_exists};

const TEACHER_SELECT: &str = r#"
    SELECT t.id, t.name, t.email, t.phone, t.address, t.birthday, t.sex, t.image_url,
           t.staff_number, t.department_id,
           COALESCE((SELECT array_agg(ct.course_id ORDER BY ct.course_id)
                     FROM course_teachers ct WHERE ct.teacher_id = t.id), '{}'::uuid[]) AS course_ids,
           t.created_at, t.updated_at
    FROM teachers t"#;

fn map_email_conflict(e: sqlx::Error) -> AppError {
    AppError::from_unique_violation(e, "A teacher with this email already exists")
}

pub struct TeacherService;

impl TeacherService {
    #[instrument(skip(db))]
    pub async fn list_teachers(db: &PgPool) -> Result<Vec<Teacher>, AppError> {
        let teachers = sqlx::query_as::<_, Teacher>(&format!("{} ORDER BY t.name", TEACHER_SELECT))
            .fetch_all(db)
            .await?;
        Ok(teachers)
    }

    #[instrument(skip(db))]
    pub async fn get_teacher(db: &PgPool, id: TeacherId) -> Result<Teacher, AppError> {
        Self::fetch_teacher(&mut *db.acquire().await?, id).await
    }

    async fn fetch_teacher(conn: &mut PgConnection, id: TeacherId) -> Result<Teacher, AppError> {
        sqlx::query_as::<_, Teacher>(&format!("{} WHERE t.id = $1", TEACHER_SELECT))
            .bind(id)
            .fetch_optional(conn)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Teacher not found")))
    }

    #[instrument(skip(db))]
    pub async fn get_teacher_by_email(db: &PgPool, email: &str) -> Result<Teacher, AppError> {
        sqlx::query_as::<_, Teacher>(&format!(
            "{} WHERE LOWER(t.email) = LOWER($1)",
            TEACHER_SELECT
        ))
        .bind(email.trim())
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Teacher not found")))
    }

    /// Creates the teacher and attaches the listed courses.
    #[instrument(skip(db))]
    pub async fn create_teacher(db: &PgPool, dto: CreateTeacherDto) -> Result<Teacher, AppError> {
        let mut tx = db.begin().await?;

        if let Some(department_id) = dto.department_id {
            ensure_exists(&mut tx, Referenced::Department, department_id).await?;
        }
        ensure_all_exist(&mut tx, Referenced::Course, &dto.course_ids).await?;

        let id = sqlx::query_scalar::<_, TeacherId>(
            r#"INSERT INTO teachers
                   (name, email, phone, address, birthday, sex, image_url, staff_number, department_id)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
               RETURNING id"#,
        )
        .bind(full_name(&dto.first_name, &dto.last_name))
        .bind(dto.email.trim())
        .bind(dto.phone.trim())
        .bind(&dto.address)
        .bind(dto.birthday)
        .bind(dto.sex)
        .bind(&dto.image_url)
        .bind(dto.staff_number.trim())
        .bind(dto.department_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_email_conflict)?;

        apply_link_diff(&mut tx, TEACHER_COURSES, id.into(), &diff_ids(&[], &dto.course_ids))
            .await?;

        let teacher = Self::fetch_teacher(&mut tx, id).await?;
        tx.commit().await?;

        info!(teacher_id = %teacher.id, "Teacher created");
        Ok(teacher)
    }

    /// Partial update. When `course_ids` is given the course links are
    /// reconciled against the stored set.
    #[instrument(skip(db))]
    pub async fn update_teacher(
        db: &PgPool,
        id: TeacherId,
        dto: UpdateTeacherDto,
    ) -> Result<Teacher, AppError> {
        let mut tx = db.begin().await?;

        sqlx::query("SELECT id FROM teachers WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Teacher not found")))?;

        if let Some(department_id) = dto.department_id {
            ensure_exists(&mut tx, Referenced::Department, department_id).await?;
        }

        sqlx::query(
            r#"UPDATE teachers
               SET name = COALESCE($2, name),
                   email = COALESCE($3, email),
                   phone = COALESCE($4, phone),
                   address = COALESCE($5, address),
                   birthday = COALESCE($6, birthday),
                   sex = COALESCE($7, sex),
                   image_url = COALESCE($8, image_url),
                   staff_number = COALESCE($9, staff_number),
                   department_id = COALESCE($10, department_id),
                   updated_at = NOW()
               WHERE id = $1"#,
        )
        .bind(id)
        .bind(dto.name())
        .bind(dto.email.as_deref().map(str::trim))
        .bind(dto.phone.as_deref().map(str::trim))
        .bind(&dto.address)
        .bind(dto.birthday)
        .bind(dto.sex)
        .bind(&dto.image_url)
        .bind(dto.staff_number.as_deref().map(str::trim))
        .bind(dto.department_id)
        .execute(&mut *tx)
        .await
        .map_err(map_email_conflict)?;

        if let Some(course_ids) = &dto.course_ids {
            ensure_all_exist(&mut tx, Referenced::Course, course_ids).await?;
            let current = Self::fetch_teacher(&mut tx, id).await?;
            apply_link_diff(
                &mut tx,
                TEACHER_COURSES,
                id.into(),
                &diff_ids(&current.course_ids, course_ids),
            )
            .await?;
        }

        let teacher = Self::fetch_teacher(&mut tx, id).await?;
        tx.commit().await?;

        Ok(teacher)
    }

    /// Deletes the teacher; course links are removed with it.
    #[instrument(skip(db))]
    pub async fn delete_teacher(db: &PgPool, id: TeacherId) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM teachers WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("Teacher not found")));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::courses::model::CreateCourseDto;
    use crate::modules::courses::service::CourseService;
    use crate::modules::results::model::RecordResultDto;
    use crate::modules::results::service::ResultService;
    use crate::modules::students::service::test_support::insert_applicant;
    use axum::http::StatusCode;
    use registrar_models::{CourseId, Sex};

    fn dto(email: &str, course_ids: Vec<CourseId>) -> CreateTeacherDto {
        CreateTeacherDto {
            email: email.to_string(),
            first_name: "Amina".to_string(),
            last_name: "Bello".to_string(),
            phone: "08030000000".to_string(),
            address: String::new(),
            birthday: None,
            sex: Sex::Female,
            image_url: None,
            staff_number: "T-001".to_string(),
            department_id: None,
            course_ids,
        }
    }

    async fn general_course(pool: &PgPool, code: &str) -> CourseId {
        CourseService::create_course(
            pool,
            CreateCourseDto {
                name: code.to_string(),
                code: code.to_string(),
                credit_unit: 2,
                semester: "First".to_string(),
                is_general: true,
                program_ids: vec![],
                teacher_ids: vec![],
            },
        )
        .await
        .unwrap()
        .id
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_create_teacher_links_both_directions(pool: PgPool) {
        let course = general_course(&pool, "GST101").await;
        let teacher = TeacherService::create_teacher(&pool, dto("amina@example.com", vec![course]))
            .await
            .unwrap();
        assert_eq!(teacher.name, "Amina Bello");
        assert_eq!(teacher.course_ids, vec![course]);

        let course = CourseService::get_course(&pool, course).await.unwrap();
        assert_eq!(course.teacher_ids, vec![teacher.id]);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_update_diffs_course_set(pool: PgPool) {
        let c1 = general_course(&pool, "GST101").await;
        let c2 = general_course(&pool, "GST102").await;
        let teacher = TeacherService::create_teacher(&pool, dto("amina@example.com", vec![c1]))
            .await
            .unwrap();

        let updated = TeacherService::update_teacher(
            &pool,
            teacher.id,
            UpdateTeacherDto {
                email: None,
                first_name: None,
                last_name: None,
                phone: Some("08031111111".to_string()),
                address: None,
                birthday: None,
                sex: None,
                image_url: None,
                staff_number: None,
                department_id: None,
                course_ids: Some(vec![c2]),
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.course_ids, vec![c2]);
        assert_eq!(updated.phone, "08031111111");

        let c1 = CourseService::get_course(&pool, c1).await.unwrap();
        assert!(c1.teacher_ids.is_empty());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_email_is_unique_and_lookup_ignores_case(pool: PgPool) {
        TeacherService::create_teacher(&pool, dto("amina@example.com", vec![]))
            .await
            .unwrap();
        let duplicate =
            TeacherService::create_teacher(&pool, dto("AMINA@example.com", vec![])).await;
        assert_eq!(duplicate.unwrap_err().status, StatusCode::CONFLICT);

        let found = TeacherService::get_teacher_by_email(&pool, "Amina@Example.com")
            .await
            .unwrap();
        assert_eq!(found.email, "amina@example.com");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_delete_detaches_courses(pool: PgPool) {
        let course = general_course(&pool, "GST101").await;
        let teacher = TeacherService::create_teacher(&pool, dto("amina@example.com", vec![course]))
            .await
            .unwrap();

        TeacherService::delete_teacher(&pool, teacher.id)
            .await
            .unwrap();
        let course = CourseService::get_course(&pool, course).await.unwrap();
        assert!(course.teacher_ids.is_empty());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_delete_keeps_recorded_results(pool: PgPool) {
        let course = general_course(&pool, "GST103").await;
        let teacher = TeacherService::create_teacher(&pool, dto("amina@example.com", vec![course]))
            .await
            .unwrap();
        let student = insert_applicant(&pool, "graded@example.com", None, None).await;
        ResultService::record_result(
            &pool,
            teacher.id,
            RecordResultDto {
                student_id: student,
                course_id: course,
                teacher_id: None,
                ca_mark: 25.0,
                exam_mark: 47.0,
                semester: "First".to_string(),
            },
        )
        .await
        .unwrap();
        let before = ResultService::calculate_cgpa(&pool, student, None).await.unwrap();
        assert_eq!(before.cgpa, 5.0);

        TeacherService::delete_teacher(&pool, teacher.id)
            .await
            .unwrap();

        let after = ResultService::calculate_cgpa(&pool, student, None).await.unwrap();
        assert_eq!(after.cgpa, 5.0);
        assert_eq!(after.total_credit_units, 2);
        let orphaned: Option<TeacherId> =
            sqlx::query_scalar("SELECT teacher_id FROM results WHERE student_id = $1")
                .bind(student)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert!(orphaned.is_none());
    }
}
