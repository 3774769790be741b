//! Programs and their enrollment counters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::ids::{DepartmentId, ProgramId};
use crate::students::StudentLevel;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Program {
    pub id: ProgramId,
    pub department_id: DepartmentId,
    pub name: String,
    pub level1_count: i32,
    pub level2_count: i32,
    pub graduate_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Program {
    pub fn counts(&self) -> ProgramCounts {
        ProgramCounts {
            level1: self.level1_count,
            level2: self.level2_count,
            graduate: self.graduate_count,
        }
    }
}

/// The three head counts of a program. Never negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ToSchema)]
pub struct ProgramCounts {
    pub level1: i32,
    pub level2: i32,
    pub graduate: i32,
}

impl ProgramCounts {
    pub fn get(&self, level: StudentLevel) -> i32 {
        match level {
            StudentLevel::Level1 => self.level1,
            StudentLevel::Level2 => self.level2,
            StudentLevel::Graduate => self.graduate,
        }
    }

    fn slot_mut(&mut self, level: StudentLevel) -> &mut i32 {
        match level {
            StudentLevel::Level1 => &mut self.level1,
            StudentLevel::Level2 => &mut self.level2,
            StudentLevel::Graduate => &mut self.graduate,
        }
    }

    /// Adds `delta` to one level, clamping the result at zero.
    pub fn adjust(mut self, level: StudentLevel, delta: i32) -> Self {
        let slot = self.slot_mut(level);
        *slot = slot.saturating_add(delta).max(0);
        self
    }

    pub fn apply_deltas(self, deltas: &ProgramCountDeltas) -> Self {
        self.adjust(StudentLevel::Level1, deltas.level1.unwrap_or(0))
            .adjust(StudentLevel::Level2, deltas.level2.unwrap_or(0))
            .adjust(StudentLevel::Graduate, deltas.graduate.unwrap_or(0))
    }

    /// Moves everyone at `from` up one level. `None` for graduates, who have
    /// nowhere to go.
    pub fn promote(self, from: StudentLevel) -> Option<(Self, i32)> {
        let to = from.next()?;
        let moved = self.get(from);
        let mut next = self;
        *next.slot_mut(to) = next.get(to).saturating_add(moved);
        *next.slot_mut(from) = 0;
        Some((next, moved))
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateProgramDto {
    pub department_id: DepartmentId,
    #[validate(length(min = 1, max = 150, message = "Program name is required"))]
    pub name: String,
}

/// Rename a program and optionally overwrite its counters.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProgramDto {
    #[validate(length(min = 1, max = 150, message = "Program name is required"))]
    pub name: Option<String>,
    #[validate(range(min = 0))]
    pub level1_count: Option<i32>,
    #[validate(range(min = 0))]
    pub level2_count: Option<i32>,
    #[validate(range(min = 0))]
    pub graduate_count: Option<i32>,
}

/// Signed counter adjustments. Results are clamped at zero.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ProgramCountDeltas {
    pub level1: Option<i32>,
    pub level2: Option<i32>,
    pub graduate: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PromoteProgramDto {
    /// Level whose students move up: `level1` or `level2`.
    pub from: StudentLevel,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProgramPromotion {
    pub program: Program,
    pub from: StudentLevel,
    pub to: StudentLevel,
    pub students_promoted: u64,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProgramFilterParams {
    #[serde(default, deserialize_with = "registrar_core::serde::deserialize_optional_id")]
    pub department_id: Option<DepartmentId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(level1: i32, level2: i32, graduate: i32) -> ProgramCounts {
        ProgramCounts {
            level1,
            level2,
            graduate,
        }
    }

    #[test]
    fn test_adjust_clamps_at_zero() {
        let c = counts(1, 0, 0).adjust(StudentLevel::Level1, -3);
        assert_eq!(c, counts(0, 0, 0));
        let c = counts(1, 0, 0).adjust(StudentLevel::Level2, 2);
        assert_eq!(c, counts(1, 2, 0));
    }

    #[test]
    fn test_apply_deltas() {
        let deltas = ProgramCountDeltas {
            level1: Some(-5),
            level2: Some(3),
            graduate: None,
        };
        assert_eq!(counts(2, 1, 7).apply_deltas(&deltas), counts(0, 4, 7));
    }

    #[test]
    fn test_promote_level1() {
        let (next, moved) = counts(5, 3, 1).promote(StudentLevel::Level1).unwrap();
        assert_eq!(next, counts(0, 8, 1));
        assert_eq!(moved, 5);
    }

    #[test]
    fn test_promote_level2_graduates() {
        let (next, moved) = counts(5, 3, 1).promote(StudentLevel::Level2).unwrap();
        assert_eq!(next, counts(5, 0, 4));
        assert_eq!(moved, 3);
    }

    #[test]
    fn test_promote_graduates_is_rejected() {
        assert!(counts(0, 0, 9).promote(StudentLevel::Graduate).is_none());
    }

    #[test]
    fn test_update_dto_rejects_negative_counts() {
        let dto = UpdateProgramDto {
            name: None,
            level1_count: Some(-1),
            level2_count: None,
            graduate_count: None,
        };
        assert!(dto.validate().is_err());
    }
}
