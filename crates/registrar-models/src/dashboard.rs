use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

/// Admitted students by sex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow, ToSchema)]
pub struct StudentStats {
    pub total: i64,
    pub male: i64,
    pub female: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow, ToSchema)]
pub struct TeacherStats {
    pub total: i64,
}
