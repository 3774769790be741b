use registrar_core::AppError;
use registrar_models::{DepartmentId, ProgramId, StudentLevel, StudentStatus};
use sqlx::PgPool;
use tracing::{info, instrument};

use crate::metrics::track_students_promoted;
use crate::modules::departments::model::{
    CreateDepartmentDto, Department, DepartmentPromotion, DepartmentWithCounts,
    UpdateDepartmentDto,
};
use crate::modules::programs::model::Program;
use crate::modules::programs::service::ProgramService;

/// Department columns plus counts summed over its programs.
const DEPARTMENT_WITH_COUNTS: &str = r#"
    SELECT d.id, d.name,
           COALESCE(SUM(p.level1_count), 0)::BIGINT AS level1_count,
           COALESCE(SUM(p.level2_count), 0)::BIGINT AS level2_count,
           COALESCE(SUM(p.graduate_count), 0)::BIGINT AS total_graduates,
           COUNT(p.id) AS program_count,
           d.created_at, d.updated_at
    FROM departments d
    LEFT JOIN programs p ON p.department_id = d.id"#;

pub struct DepartmentService;

impl DepartmentService {
    #[instrument(skip(db))]
    pub async fn list_departments(db: &PgPool) -> Result<Vec<DepartmentWithCounts>, AppError> {
        let departments = sqlx::query_as::<_, DepartmentWithCounts>(&format!(
            "{} GROUP BY d.id ORDER BY d.name",
            DEPARTMENT_WITH_COUNTS
        ))
        .fetch_all(db)
        .await?;

        Ok(departments)
    }

    #[instrument(skip(db))]
    pub async fn get_department(
        db: &PgPool,
        id: DepartmentId,
    ) -> Result<DepartmentWithCounts, AppError> {
        sqlx::query_as::<_, DepartmentWithCounts>(&format!(
            "{} WHERE d.id = $1 GROUP BY d.id",
            DEPARTMENT_WITH_COUNTS
        ))
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Department not found")))
    }

    #[instrument(skip(db))]
    pub async fn create_department(
        db: &PgPool,
        dto: CreateDepartmentDto,
    ) -> Result<Department, AppError> {
        let department = sqlx::query_as::<_, Department>(
            r#"INSERT INTO departments (name)
               VALUES ($1)
               RETURNING id, name, created_at, updated_at"#,
        )
        .bind(dto.name.trim())
        .fetch_one(db)
        .await
        .map_err(|e| {
            AppError::from_unique_violation(e, "A department with this name already exists")
        })?;

        Ok(department)
    }

    #[instrument(skip(db))]
    pub async fn update_department(
        db: &PgPool,
        id: DepartmentId,
        dto: UpdateDepartmentDto,
    ) -> Result<Department, AppError> {
        sqlx::query_as::<_, Department>(
            r#"UPDATE departments
               SET name = $2, updated_at = NOW()
               WHERE id = $1
               RETURNING id, name, created_at, updated_at"#,
        )
        .bind(id)
        .bind(dto.name.trim())
        .fetch_optional(db)
        .await
        .map_err(|e| {
            AppError::from_unique_violation(e, "A department with this name already exists")
        })?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Department not found")))
    }

    /// Deletes the department's programs, then the department, in one
    /// transaction.
    #[instrument(skip(db))]
    pub async fn delete_department(db: &PgPool, id: DepartmentId) -> Result<(), AppError> {
        let mut tx = db.begin().await?;

        let programs_deleted = sqlx::query("DELETE FROM programs WHERE department_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let result = sqlx::query("DELETE FROM departments WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("Department not found")));
        }

        tx.commit().await?;

        info!(department_id = %id, programs_deleted, "Department deleted");
        Ok(())
    }

    /// Promotes level 1 to level 2 across every program of the department.
    /// Counters and the admitted students' levels move together.
    #[instrument(skip(db))]
    pub async fn promote_department(
        db: &PgPool,
        id: DepartmentId,
    ) -> Result<DepartmentPromotion, AppError> {
        let mut tx = db.begin().await?;

        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM departments WHERE id = $1)",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        if !exists {
            return Err(AppError::not_found(anyhow::anyhow!("Department not found")));
        }

        let programs = sqlx::query_as::<_, Program>(
            r#"SELECT id, department_id, name, level1_count, level2_count, graduate_count,
                      created_at, updated_at
               FROM programs
               WHERE department_id = $1 AND level1_count > 0
               ORDER BY id
               FOR UPDATE"#,
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        let mut promoted: Vec<ProgramId> = Vec::with_capacity(programs.len());
        for program in &programs {
            if let Some((counts, _)) = program.counts().promote(StudentLevel::Level1) {
                ProgramService::save_counts(&mut tx, program.id, counts).await?;
                promoted.push(program.id);
            }
        }

        let students_promoted = sqlx::query(
            r#"UPDATE students SET level = $2, updated_at = NOW()
               WHERE program_id = ANY($1) AND level = $3 AND status = $4"#,
        )
        .bind(&promoted)
        .bind(StudentLevel::Level2)
        .bind(StudentLevel::Level1)
        .bind(StudentStatus::Admitted)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;

        info!(
            department_id = %id,
            programs_promoted = promoted.len(),
            students_promoted,
            "Department promoted"
        );
        track_students_promoted(students_promoted);

        Ok(DepartmentPromotion {
            department_id: id,
            programs_promoted: promoted.len() as u64,
            students_promoted,
        })
    }
}
