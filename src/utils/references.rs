use std::collections::HashSet;

use registrar_core::AppError;
use sqlx::PgConnection;
use uuid::Uuid;

/// Tables whose ids request bodies refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Referenced {
    Department,
    Program,
    Course,
    Teacher,
    Level,
    Student,
}

impl Referenced {
    const fn table(&self) -> &'static str {
        match self {
            Self::Department => "departments",
            Self::Program => "programs",
            Self::Course => "courses",
            Self::Teacher => "teachers",
            Self::Level => "levels",
            Self::Student => "students",
        }
    }

    const fn label(&self) -> &'static str {
        match self {
            Self::Department => "Department",
            Self::Program => "Program",
            Self::Course => "Course",
            Self::Teacher => "Teacher",
            Self::Level => "Level",
            Self::Student => "Student",
        }
    }
}

/// Fails with 404 unless every id exists in the referenced table.
pub async fn ensure_all_exist<T>(
    conn: &mut PgConnection,
    referenced: Referenced,
    ids: &[T],
) -> Result<(), AppError>
where
    T: Copy + Eq + std::hash::Hash + Into<Uuid>,
{
    let unique: Vec<Uuid> = ids
        .iter()
        .copied()
        .collect::<HashSet<T>>()
        .into_iter()
        .map(Into::into)
        .collect();
    if unique.is_empty() {
        return Ok(());
    }

    let found = sqlx::query_scalar::<_, i64>(&format!(
        "SELECT COUNT(*) FROM {} WHERE id = ANY($1)",
        referenced.table()
    ))
    .bind(&unique)
    .fetch_one(conn)
    .await?;

    if found != unique.len() as i64 {
        let noun = if unique.len() == 1 {
            referenced.label().to_string()
        } else {
            format!("One or more {}s", referenced.label().to_lowercase())
        };
        return Err(AppError::not_found(anyhow::anyhow!("{} not found", noun)));
    }

    Ok(())
}

pub async fn ensure_exists<T>(
    conn: &mut PgConnection,
    referenced: Referenced,
    id: T,
) -> Result<(), AppError>
where
    T: Copy + Eq + std::hash::Hash + Into<Uuid>,
{
    ensure_all_exist(conn, referenced, &[id]).await
}

