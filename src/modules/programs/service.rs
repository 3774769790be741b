use registrar_core::AppError;
use registrar_models::{DepartmentId, ProgramId, StudentLevel, StudentStatus};
use sqlx::{PgConnection, PgPool};
use tracing::{info, instrument};

use crate::metrics::track_students_promoted;
use crate::modules::programs::model::{
    CreateProgramDto, Program, ProgramCountDeltas, ProgramCounts, ProgramFilterParams,
    ProgramPromotion, UpdateProgramDto,
};

const PROGRAM_COLUMNS: &str = "id, department_id, name, level1_count, level2_count, \
                               graduate_count, created_at, updated_at";

pub struct ProgramService;

impl ProgramService {
    #[instrument(skip(db))]
    pub async fn list_programs(
        db: &PgPool,
        filters: ProgramFilterParams,
    ) -> Result<Vec<Program>, AppError> {
        let programs = sqlx::query_as::<_, Program>(&format!(
            "SELECT {} FROM programs
             WHERE ($1::uuid IS NULL OR department_id = $1)
             ORDER BY name",
            PROGRAM_COLUMNS
        ))
        .bind(filters.department_id)
        .fetch_all(db)
        .await?;

        Ok(programs)
    }

    #[instrument(skip(db))]
    pub async fn get_program(db: &PgPool, id: ProgramId) -> Result<Program, AppError> {
        sqlx::query_as::<_, Program>(&format!(
            "SELECT {} FROM programs WHERE id = $1",
            PROGRAM_COLUMNS
        ))
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Program not found")))
    }

    /// Finds a program by its exact name within a department.
    pub(crate) async fn find_by_name(
        conn: &mut PgConnection,
        department_id: DepartmentId,
        name: &str,
    ) -> Result<Option<Program>, AppError> {
        let program = sqlx::query_as::<_, Program>(&format!(
            "SELECT {} FROM programs
             WHERE department_id = $1 AND name = $2
             FOR UPDATE",
            PROGRAM_COLUMNS
        ))
        .bind(department_id)
        .bind(name)
        .fetch_optional(conn)
        .await?;

        Ok(program)
    }

    #[instrument(skip(db))]
    pub async fn create_program(db: &PgPool, dto: CreateProgramDto) -> Result<Program, AppError> {
        let program = sqlx::query_as::<_, Program>(&format!(
            "INSERT INTO programs (department_id, name) VALUES ($1, $2) RETURNING {}",
            PROGRAM_COLUMNS
        ))
        .bind(dto.department_id)
        .bind(dto.name.trim())
        .fetch_one(db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::conflict(anyhow::anyhow!(
                        "A program with this name already exists in this department"
                    ));
                }
                if db_err.is_foreign_key_violation() {
                    return AppError::not_found(anyhow::anyhow!("Department not found"));
                }
            }
            AppError::from(e)
        })?;

        Ok(program)
    }

    /// Renames the program and, when given, overwrites its counters.
    #[instrument(skip(db))]
    pub async fn update_program(
        db: &PgPool,
        id: ProgramId,
        dto: UpdateProgramDto,
    ) -> Result<Program, AppError> {
        let mut tx = db.begin().await?;

        let current = Self::lock_program(&mut tx, id).await?;
        let counts = ProgramCounts {
            level1: dto.level1_count.unwrap_or(current.level1_count),
            level2: dto.level2_count.unwrap_or(current.level2_count),
            graduate: dto.graduate_count.unwrap_or(current.graduate_count),
        };
        let name = dto
            .name
            .as_deref()
            .map(str::trim)
            .unwrap_or(&current.name)
            .to_string();

        let program = sqlx::query_as::<_, Program>(&format!(
            "UPDATE programs
             SET name = $2, level1_count = $3, level2_count = $4, graduate_count = $5,
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {}",
            PROGRAM_COLUMNS
        ))
        .bind(id)
        .bind(name)
        .bind(counts.level1)
        .bind(counts.level2)
        .bind(counts.graduate)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            AppError::from_unique_violation(
                e,
                "A program with this name already exists in this department",
            )
        })?;

        tx.commit().await?;
        Ok(program)
    }

    #[instrument(skip(db))]
    pub async fn delete_program(db: &PgPool, id: ProgramId) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM programs WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("Program not found")));
        }

        Ok(())
    }

    /// Applies signed deltas to the counters, clamping each at zero.
    #[instrument(skip(db))]
    pub async fn update_program_counts(
        db: &PgPool,
        id: ProgramId,
        deltas: ProgramCountDeltas,
    ) -> Result<Program, AppError> {
        let mut tx = db.begin().await?;

        let current = Self::lock_program(&mut tx, id).await?;
        let program = Self::save_counts(&mut tx, id, current.counts().apply_deltas(&deltas)).await?;

        tx.commit().await?;
        Ok(program)
    }

    /// Moves every student of one program up from `from`. Admitted students
    /// at that level follow their counter.
    #[instrument(skip(db))]
    pub async fn promote_program(
        db: &PgPool,
        id: ProgramId,
        from: StudentLevel,
    ) -> Result<ProgramPromotion, AppError> {
        let to = from
            .next()
            .ok_or_else(|| AppError::unprocessable(anyhow::anyhow!("Graduates cannot be promoted")))?;

        let mut tx = db.begin().await?;

        let current = Self::lock_program(&mut tx, id).await?;
        let (counts, moved) = current
            .counts()
            .promote(from)
            .ok_or_else(|| AppError::unprocessable(anyhow::anyhow!("Graduates cannot be promoted")))?;
        let program = Self::save_counts(&mut tx, id, counts).await?;

        let students_promoted = sqlx::query(
            "UPDATE students SET level = $3, updated_at = NOW()
             WHERE program_id = $1 AND level = $2 AND status = $4",
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .bind(StudentStatus::Admitted)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;

        info!(program_id = %id, %from, %to, counter_moved = moved, students_promoted, "Program promoted");
        track_students_promoted(students_promoted);

        Ok(ProgramPromotion {
            program,
            from,
            to,
            students_promoted,
        })
    }

    /// Locks the program row for the rest of the transaction.
    pub(crate) async fn lock_program(
        conn: &mut PgConnection,
        id: ProgramId,
    ) -> Result<Program, AppError> {
        sqlx::query_as::<_, Program>(&format!(
            "SELECT {} FROM programs WHERE id = $1 FOR UPDATE",
            PROGRAM_COLUMNS
        ))
        .bind(id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Program not found")))
    }

    pub(crate) async fn save_counts(
        conn: &mut PgConnection,
        id: ProgramId,
        counts: ProgramCounts,
    ) -> Result<Program, AppError> {
        let program = sqlx::query_as::<_, Program>(&format!(
            "UPDATE programs
             SET level1_count = $2, level2_count = $3, graduate_count = $4, updated_at = NOW()
             WHERE id = $1
             RETURNING {}",
            PROGRAM_COLUMNS
        ))
        .bind(id)
        .bind(counts.level1)
        .bind(counts.level2)
        .bind(counts.graduate)
        .fetch_one(conn)
        .await?;

        Ok(program)
    }

    /// Adds `delta` to one level counter of a locked program, clamped at 0.
    pub(crate) async fn adjust_counter(
        conn: &mut PgConnection,
        id: ProgramId,
        level: StudentLevel,
        delta: i32,
    ) -> Result<Program, AppError> {
        let current = Self::lock_program(conn, id).await?;
        Self::save_counts(conn, id, current.counts().adjust(level, delta)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    async fn department(pool: &PgPool, name: &str) -> DepartmentId {
        sqlx::query_scalar("INSERT INTO departments (name) VALUES ($1) RETURNING id")
            .bind(name)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    async fn program(pool: &PgPool, department_id: DepartmentId, name: &str) -> Program {
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
    async fn test_create_program_starts_at_zero(pool: PgPool) {
        let dept = department(&pool, "Health Sciences").await;
        let p = program(&pool, dept, "Nursing").await;
        assert_eq!(p.counts(), ProgramCounts::default());

        let duplicate = ProgramService::create_program(
            &pool,
            CreateProgramDto {
                department_id: dept,
                name: "Nursing".to_string(),
            },
        )
        .await;
        assert_eq!(duplicate.unwrap_err().status, StatusCode::CONFLICT);

        let orphan = ProgramService::create_program(
            &pool,
            CreateProgramDto {
                department_id: DepartmentId::new(),
                name: "Pharmacy".to_string(),
            },
        )
        .await;
        assert_eq!(orphan.unwrap_err().status, StatusCode::NOT_FOUND);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_update_counts_clamps_at_zero(pool: PgPool) {
        let dept = department(&pool, "Sciences").await;
        let p = program(&pool, dept, "Lab Tech").await;

        let updated = ProgramService::update_program_counts(
            &pool,
            p.id,
            ProgramCountDeltas {
                level1: Some(3),
                level2: Some(-2),
                graduate: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.level1_count, 3);
        assert_eq!(updated.level2_count, 0);

        let updated = ProgramService::update_program_counts(
            &pool,
            p.id,
            ProgramCountDeltas {
                level1: Some(-10),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.level1_count, 0);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_promote_program_level2_to_graduate(pool: PgPool) {
        let dept = department(&pool, "Community Health").await;
        let p = program(&pool, dept, "CHEW").await;
        ProgramService::update_program_counts(
            &pool,
            p.id,
            ProgramCountDeltas {
                level1: Some(4),
                level2: Some(6),
                graduate: Some(1),
            },
        )
        .await
        .unwrap();

        let promotion = ProgramService::promote_program(&pool, p.id, StudentLevel::Level2)
            .await
            .unwrap();
        assert_eq!(promotion.to, StudentLevel::Graduate);
        assert_eq!(promotion.program.level1_count, 4);
        assert_eq!(promotion.program.level2_count, 0);
        assert_eq!(promotion.program.graduate_count, 7);

        let graduates = ProgramService::promote_program(&pool, p.id, StudentLevel::Graduate).await;
        assert_eq!(
            graduates.unwrap_err().status,
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }
}
