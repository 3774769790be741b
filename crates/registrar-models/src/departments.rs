use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::ids::DepartmentId;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Department {
    pub id: DepartmentId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Department read model. The counts are sums over the department's
/// programs, computed at query time.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct DepartmentWithCounts {
    pub id: DepartmentId,
    pub name: String,
    pub level1_count: i64,
    pub level2_count: i64,
    pub total_graduates: i64,
    pub program_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateDepartmentDto {
    #[validate(length(min = 1, max = 150, message = "Department name is required"))]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateDepartmentDto {
    #[validate(length(min = 1, max = 150, message = "Department name is required"))]
    pub name: String,
}

/// Outcome of moving a department's level 1 cohort to level 2.
#[derive(Debug, Serialize, ToSchema)]
pub struct DepartmentPromotion {
    pub department_id: DepartmentId,
    pub programs_promoted: u64,
    pub students_promoted: u64,
}
