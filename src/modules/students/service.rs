use registrar_core::{AppError, Paginated};
use registrar_models::{DepartmentId, ProgramId, StudentId};
use sqlx::{PgConnection, PgPool};
use tracing::{info, instrument, warn};

use crate::metrics::track_admission_decision;
use crate::modules::programs::service::ProgramService;
use crate::modules::students::model::{
    AssignmentChange, Placement, StatusEffect, Student, StudentFilterParams, StudentLevel,
    StudentStatus, StudentSummary, UpdateStudentAssignmentDto, status_effect,
};

pub(crate) const STUDENT_COLUMNS: &str = r#"
    id, user_id, first_name, middle_name, last_name, email, phone, date_of_birth, sex,
    address, city, state, zip_code, lga, religion, image_url, department_id, program_id,
    program_name, level, concentration, start_term, academic, health, documents,
    recommendation_letters, agree_terms, application_number, application_date,
    screening_slot_id, status, created_at, updated_at"#;

const STUDENT_SUMMARY_SELECT: &str = r#"
    SELECT s.id, s.first_name, s.last_name, s.email, s.phone, s.sex, s.image_url,
           s.department_id, d.name AS department_name, s.program_id, s.program_name,
           s.level, s.application_number, s.application_date, s.status
    FROM students s
    LEFT JOIN departments d ON d.id = s.department_id"#;

const STUDENT_FILTERS: &str = r#"
    WHERE ($1::text IS NULL OR s.status = $1)
      AND ($2::uuid IS NULL OR s.department_id = $2)
      AND ($3::uuid IS NULL OR s.program_id = $3)
      AND ($4::text IS NULL OR s.level = $4)"#;

pub struct StudentService;

impl StudentService {
    #[instrument(skip(db))]
    pub async fn list_students(
        db: &PgPool,
        filters: StudentFilterParams,
    ) -> Result<Paginated<StudentSummary>, AppError> {
        let limit = filters.pagination.limit();
        let offset = filters.pagination.offset();

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM students s{}",
            STUDENT_FILTERS
        ))
        .bind(filters.status)
        .bind(filters.department_id)
        .bind(filters.program_id)
        .bind(filters.level)
        .fetch_one(db)
        .await?;

        let students = sqlx::query_as::<_, StudentSummary>(&format!(
            "{}{} ORDER BY s.application_date DESC LIMIT {} OFFSET {}",
            STUDENT_SUMMARY_SELECT, STUDENT_FILTERS, limit, offset
        ))
        .bind(filters.status)
        .bind(filters.department_id)
        .bind(filters.program_id)
        .bind(filters.level)
        .fetch_all(db)
        .await?;

        Ok(Paginated::new(students, total, &filters.pagination))
    }

    #[instrument(skip(db))]
    pub async fn get_student(db: &PgPool, id: StudentId) -> Result<Student, AppError> {
        sqlx::query_as::<_, Student>(&format!(
            "SELECT {} FROM students WHERE id = $1",
            STUDENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Student not found")))
    }

    pub(crate) async fn lock_student(
        conn: &mut PgConnection,
        id: StudentId,
    ) -> Result<Student, AppError> {
        sqlx::query_as::<_, Student>(&format!(
            "SELECT {} FROM students WHERE id = $1 FOR UPDATE",
            STUDENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Student not found")))
    }

    /// Changes the admission status and keeps program counters in step.
    ///
    /// Admitting places the student in level 1 of the program named on the
    /// application; leaving `admitted` releases the unit held at the current
    /// level. Moving between `progress` and `rejected` touches nothing else.
    #[instrument(skip(db))]
    pub async fn update_status(
        db: &PgPool,
        id: StudentId,
        status: StudentStatus,
    ) -> Result<Student, AppError> {
        let mut tx = db.begin().await?;

        let student = Self::lock_student(&mut tx, id).await?;
        let previous = student.status;

        match status_effect(previous, status) {
            StatusEffect::Enroll => {
                let (department_id, program_name) = match (
                    student.department_id,
                    student.program_name.as_deref().map(str::trim),
                ) {
                    (Some(department_id), Some(name)) if !name.is_empty() => {
                        (department_id, name.to_string())
                    }
                    _ => {
                        return Err(AppError::unprocessable(anyhow::anyhow!(
                            "Student has no department or program assigned"
                        )));
                    }
                };

                let program = ProgramService::find_by_name(&mut tx, department_id, &program_name)
                    .await?
                    .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Program not found")))?;
                ProgramService::adjust_counter(&mut tx, program.id, StudentLevel::Level1, 1)
                    .await?;

                sqlx::query(
                    r#"UPDATE students
                       SET status = $2, program_id = $3, level = $4, updated_at = NOW()
                       WHERE id = $1"#,
                )
                .bind(id)
                .bind(status)
                .bind(program.id)
                .bind(StudentLevel::Level1)
                .execute(&mut *tx)
                .await?;
            }
            StatusEffect::Unenroll => {
                if let Some(placement) = student.placement() {
                    ProgramService::adjust_counter(
                        &mut tx,
                        placement.program_id,
                        placement.level,
                        -1,
                    )
                    .await?;
                }

                sqlx::query(
                    r#"UPDATE students
                       SET status = $2, level = NULL, updated_at = NOW()
                       WHERE id = $1"#,
                )
                .bind(id)
                .bind(status)
                .execute(&mut *tx)
                .await?;
            }
            StatusEffect::None => {
                sqlx::query("UPDATE students SET status = $2, updated_at = NOW() WHERE id = $1")
                    .bind(id)
                    .bind(status)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        let student = Self::lock_student(&mut tx, id).await?;
        tx.commit().await?;

        info!(student_id = %id, from = %previous, to = %status, "Student status updated");
        track_admission_decision(status.as_str());

        Ok(student)
    }

    /// Moves a student to another department, program or level.
    ///
    /// The old placement is released, the row patched, and the new placement
    /// claimed against a fresh read of the program, in that order.
    #[instrument(skip(db))]
    pub async fn update_student_assignment(
        db: &PgPool,
        id: StudentId,
        dto: UpdateStudentAssignmentDto,
    ) -> Result<Student, AppError> {
        let mut tx = db.begin().await?;

        let student = Self::lock_student(&mut tx, id).await?;

        let department_id = dto.department_id.or(student.department_id);
        let program_id = dto.program_id.or(student.program_id);
        let level = dto.level.or(student.level);

        let mut program_name = student.program_name.clone();
        if let Some(new_program) = dto.program_id {
            let program = ProgramService::lock_program(&mut tx, new_program).await?;
            if let Some(department_id) = department_id {
                ensure_program_in_department(program.department_id, department_id, new_program)?;
            }
            program_name = Some(program.name);
        } else if let (Some(new_department), Some(current)) = (dto.department_id, program_id) {
            let program = ProgramService::lock_program(&mut tx, current).await?;
            ensure_program_in_department(program.department_id, new_department, current)?;
        }

        let change = AssignmentChange::plan(
            student.status,
            student.placement(),
            Placement::of(program_id, level),
        );

        if let Some(release) = change.release {
            ProgramService::adjust_counter(&mut tx, release.program_id, release.level, -1).await?;
        }

        sqlx::query(
            r#"UPDATE students
               SET department_id = $2, program_id = $3, program_name = $4, level = $5,
                   updated_at = NOW()
               WHERE id = $1"#,
        )
        .bind(id)
        .bind(department_id)
        .bind(program_id)
        .bind(&program_name)
        .bind(level)
        .execute(&mut *tx)
        .await?;

        if let Some(claim) = change.claim {
            ProgramService::adjust_counter(&mut tx, claim.program_id, claim.level, 1).await?;
        }

        let student = Self::lock_student(&mut tx, id).await?;
        tx.commit().await?;

        info!(student_id = %id, "Student assignment updated");
        Ok(student)
    }
}

fn ensure_program_in_department(
    actual: DepartmentId,
    expected: DepartmentId,
    program_id: ProgramId,
) -> Result<(), AppError> {
    if actual != expected {
        warn!(%program_id, department_id = %expected, "Program belongs to another department");
        return Err(AppError::unprocessable(anyhow::anyhow!(
            "Program does not belong to the given department"
        )));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use registrar_models::UserId;

    /// Inserts a user and an in-progress application for them.
    pub(crate) async fn insert_applicant(
        pool: &PgPool,
        email: &str,
        department_id: Option<DepartmentId>,
        program_name: Option<&str>,
    ) -> StudentId {
        let user_id: UserId = sqlx::query_scalar(
            "INSERT INTO users (external_identity_ref, email) VALUES ($1, $1) RETURNING id",
        )
        .bind(email)
        .fetch_one(pool)
        .await
        .unwrap();

        sqlx::query_scalar(
            r#"INSERT INTO students
                   (user_id, first_name, last_name, email, phone, date_of_birth, sex,
                    department_id, program_name, application_number)
               VALUES ($1, 'Zainab', 'Musa', $2, '0800', '2004-02-01', 'female', $3, $4, $2)
               RETURNING id"#,
        )
        .bind(user_id)
        .bind(email)
        .bind(department_id)
        .bind(program_name)
        .fetch_one(pool)
        .await
        .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::insert_applicant;
    use super::*;
    use crate::modules::programs::model::{CreateProgramDto, Program};
    use axum::http::StatusCode;

    async fn program(pool: &PgPool, department: &str, name: &str) -> Program {
        let department_id: DepartmentId =
            sqlx::query_scalar("INSERT INTO departments (name) VALUES ($1) RETURNING id")
                .bind(department)
                .fetch_one(pool)
                .await
                .unwrap();
        ProgramService::create_program(
            pool,
            CreateProgramDto {
                department_id,
                name: name.to_string(),
            },
        )
        .await
        .unwrap()
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_admit_increments_level1_once(pool: PgPool) {
        let nursing = program(&pool, "Health", "Nursing").await;
        let student =
            insert_applicant(&pool, "a@example.com", Some(nursing.department_id), Some("Nursing"))
                .await;

        let admitted = StudentService::update_status(&pool, student, StudentStatus::Admitted)
            .await
            .unwrap();
        assert_eq!(admitted.program_id, Some(nursing.id));
        assert_eq!(admitted.level, Some(StudentLevel::Level1));

        StudentService::update_status(&pool, student, StudentStatus::Admitted)
            .await
            .unwrap();
        let nursing = ProgramService::get_program(&pool, nursing.id).await.unwrap();
        assert_eq!(nursing.level1_count, 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_admission_matches_program_name_exactly(pool: PgPool) {
        let upper = program(&pool, "Health", "Nursing").await;
        let lower = ProgramService::create_program(
            &pool,
            CreateProgramDto {
                department_id: upper.department_id,
                name: "nursing".to_string(),
            },
        )
        .await
        .unwrap();

        let student =
            insert_applicant(&pool, "f@example.com", Some(upper.department_id), Some("nursing"))
                .await;
        let admitted = StudentService::update_status(&pool, student, StudentStatus::Admitted)
            .await
            .unwrap();
        assert_eq!(admitted.program_id, Some(lower.id));

        let upper = ProgramService::get_program(&pool, upper.id).await.unwrap();
        assert_eq!(upper.level1_count, 0);

        let unmatched =
            insert_applicant(&pool, "g@example.com", Some(upper.department_id), Some("NURSING"))
                .await;
        let err = StudentService::update_status(&pool, unmatched, StudentStatus::Admitted)
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_leaving_admitted_releases_current_level(pool: PgPool) {
        let nursing = program(&pool, "Health", "Nursing").await;
        let student =
            insert_applicant(&pool, "b@example.com", Some(nursing.department_id), Some("Nursing"))
                .await;
        StudentService::update_status(&pool, student, StudentStatus::Admitted)
            .await
            .unwrap();

        let rejected = StudentService::update_status(&pool, student, StudentStatus::Rejected)
            .await
            .unwrap();
        assert_eq!(rejected.level, None);
        let nursing = ProgramService::get_program(&pool, nursing.id).await.unwrap();
        assert_eq!(nursing.level1_count, 0);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_admit_requires_assignment_and_existing_program(pool: PgPool) {
        let unassigned = insert_applicant(&pool, "c@example.com", None, None).await;
        let err = StudentService::update_status(&pool, unassigned, StudentStatus::Admitted)
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);

        let nursing = program(&pool, "Health", "Nursing").await;
        let unknown = insert_applicant(
            &pool,
            "d@example.com",
            Some(nursing.department_id),
            Some("Pharmacy"),
        )
        .await;
        let err = StudentService::update_status(&pool, unknown, StudentStatus::Admitted)
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);

        let missing =
            StudentService::update_status(&pool, StudentId::new(), StudentStatus::Rejected).await;
        assert_eq!(missing.unwrap_err().status, StatusCode::NOT_FOUND);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_level_change_in_same_program_moves_one_unit(pool: PgPool) {
        let nursing = program(&pool, "Health", "Nursing").await;
        let student =
            insert_applicant(&pool, "e@example.com", Some(nursing.department_id), Some("Nursing"))
                .await;
        StudentService::update_status(&pool, student, StudentStatus::Admitted)
            .await
            .unwrap();

        let moved = StudentService::update_student_assignment(
            &pool,
            student,
            UpdateStudentAssignmentDto {
                department_id: None,
                program_id: None,
                level: Some(StudentLevel::Level2),
            },
        )
        .await
        .unwrap();
        assert_eq!(moved.level, Some(StudentLevel::Level2));

        let nursing = ProgramService::get_program(&pool, nursing.id).await.unwrap();
        assert_eq!((nursing.level1_count, nursing.level2_count), (0, 1));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_reassignment_rejects_program_of_other_department(pool: PgPool) {
        let nursing = program(&pool, "Health", "Nursing").await;
        let physics = program(&pool, "Sciences", "Physics").await;
        let student =
            insert_applicant(&pool, "f@example.com", Some(nursing.department_id), Some("Nursing"))
                .await;

        let err = StudentService::update_student_assignment(
            &pool,
            student,
            UpdateStudentAssignmentDto {
                department_id: Some(nursing.department_id),
                program_id: Some(physics.id),
                level: None,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);

        let moved = StudentService::update_student_assignment(
            &pool,
            student,
            UpdateStudentAssignmentDto {
                department_id: Some(physics.department_id),
                program_id: Some(physics.id),
                level: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(moved.program_name.as_deref(), Some("Physics"));
        let physics = ProgramService::get_program(&pool, physics.id).await.unwrap();
        assert_eq!(physics.level1_count, 0);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_list_students_filters_by_status(pool: PgPool) {
        let nursing = program(&pool, "Health", "Nursing").await;
        let admitted =
            insert_applicant(&pool, "g@example.com", Some(nursing.department_id), Some("Nursing"))
                .await;
        insert_applicant(&pool, "h@example.com", Some(nursing.department_id), Some("Nursing"))
            .await;
        StudentService::update_status(&pool, admitted, StudentStatus::Admitted)
            .await
            .unwrap();

        let page = StudentService::list_students(
            &pool,
            StudentFilterParams {
                status: Some(StudentStatus::Admitted),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(page.meta.total, 1);
        assert_eq!(page.data[0].id, admitted);
        assert_eq!(page.data[0].department_name.as_deref(), Some("Health"));
    }
}
