use registrar_core::AppError;
use registrar_models::{StudentId, TeacherId};
use sqlx::PgPool;

use crate::middleware::auth::AuthUser;

/// Teacher record of the signed-in user, matched on email.
pub async fn current_teacher_id(db: &PgPool, auth_user: &AuthUser) -> Result<TeacherId, AppError> {
    sqlx::query_scalar::<_, TeacherId>("SELECT id FROM teachers WHERE LOWER(email) = LOWER($1)")
        .bind(auth_user.email())
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Teacher profile not found")))
}

/// Student record of the signed-in user.
pub async fn current_student_id(db: &PgPool, auth_user: &AuthUser) -> Result<StudentId, AppError> {
    sqlx::query_scalar::<_, StudentId>("SELECT id FROM students WHERE user_id = $1")
        .bind(auth_user.user_id())
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Student record not found")))
}
