use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::ids::LevelId;

/// Reference level referenced by exam timetables.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Level {
    pub id: LevelId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Rows created by level initialization, as (name, description).
pub const DEFAULT_LEVELS: [(&str, &str); 3] = [
    ("Level 1", "First year students"),
    ("Level 2", "Second year students"),
    ("Graduate", "Graduated students"),
];

#[derive(Debug, Serialize, ToSchema)]
pub struct InitializeLevelsResponse {
    pub created: u64,
    pub levels: Vec<Level>,
}
