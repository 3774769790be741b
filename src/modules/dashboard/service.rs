use registrar_core::AppError;
use sqlx::PgPool;
use tracing::instrument;

use crate::modules::dashboard::model::{StudentStats, TeacherStats};
use crate::modules::students::model::StudentStatus;

pub struct DashboardService;

impl DashboardService {
    /// Counts admitted students only.
    #[instrument(skip(db))]
    pub async fn student_stats(db: &PgPool) -> Result<StudentStats, AppError> {
        let stats = sqlx::query_as::<_, StudentStats>(
            r#"SELECT COUNT(*) AS total,
                      COUNT(*) FILTER (WHERE sex = 'male') AS male,
                      COUNT(*) FILTER (WHERE sex = 'female') AS female
               FROM students
               WHERE status = $1"#,
        )
        .bind(StudentStatus::Admitted)
        .fetch_one(db)
        .await?;
        Ok(stats)
    }

    #[instrument(skip(db))]
    pub async fn teacher_stats(db: &PgPool) -> Result<TeacherStats, AppError> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM teachers")
            .fetch_one(db)
            .await?;
        Ok(TeacherStats { total })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::students::service::test_support::insert_applicant;

    #[sqlx::test(migrations = "./migrations")]
    async fn test_student_stats_count_admitted_only(pool: PgPool) {
        let admitted = insert_applicant(&pool, "one@example.com", None, None).await;
        insert_applicant(&pool, "two@example.com", None, None).await;
        sqlx::query("UPDATE students SET status = 'admitted' WHERE id = $1")
            .bind(admitted)
            .execute(&pool)
            .await
            .unwrap();

        let stats = DashboardService::student_stats(&pool).await.unwrap();
        assert_eq!(
            stats,
            StudentStats {
                total: 1,
                male: 0,
                female: 1
            }
        );

        let teachers = DashboardService::teacher_stats(&pool).await.unwrap();
        assert_eq!(teachers.total, 0);
    }
}
