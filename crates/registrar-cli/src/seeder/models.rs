//! Data models for database seeding configuration.
//!
//! Seed rows carry client-generated ids so that link tables can be filled in
//! the same transaction without reading anything back.

use chrono::NaiveDate;
use registrar_models::{ClockTime, CourseId, DepartmentId, ProgramId, Sex, TeacherId};

/// Seed data for creating a department.
pub struct DepartmentSeed {
    pub id: DepartmentId,
    pub name: String,
}

/// Seed data for creating a program.
pub struct ProgramSeed {
    pub id: ProgramId,
    pub department_id: DepartmentId,
    pub name: String,
}

/// Seed data for creating a teacher profile.
pub struct TeacherSeed {
    pub id: TeacherId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub sex: Sex,
    pub staff_number: String,
    pub department_id: DepartmentId,
}

/// Seed data for creating a course together with its links.
pub struct CourseSeed {
    pub id: CourseId,
    pub name: String,
    pub code: String,
    pub credit_unit: i32,
    pub semester: String,
    pub is_general: bool,
    pub program_ids: Vec<ProgramId>,
    pub teacher_ids: Vec<TeacherId>,
}

/// Seed data for creating a screening slot.
pub struct SlotSeed {
    pub date: NaiveDate,
    pub start_time: ClockTime,
    pub max_capacity: i32,
}

/// Configuration for the catalog generated under each department.
#[derive(Clone)]
pub struct CatalogPerDepartment {
    pub programs: usize,
    pub teachers: usize,
    pub courses_per_program: usize,
}

impl Default for CatalogPerDepartment {
    fn default() -> Self {
        Self {
            programs: 3,
            teachers: 6,
            courses_per_program: 8,
        }
    }
}

/// Configuration for screening slots.
#[derive(Clone)]
pub struct SlotsConfig {
    /// Weekdays to cover, starting tomorrow.
    pub days: usize,
    pub times: Vec<ClockTime>,
    pub max_capacity: i32,
}

impl Default for SlotsConfig {
    fn default() -> Self {
        Self {
            days: 10,
            times: [(9, 0), (11, 0), (14, 0)]
                .into_iter()
                .filter_map(|(h, m)| ClockTime::from_hm(h, m))
                .collect(),
            max_capacity: 50,
        }
    }
}

/// Complete configuration for database seeding.
#[derive(Clone, Default)]
pub struct SeedConfig {
    pub num_departments: usize,
    pub catalog: CatalogPerDepartment,
    pub slots: SlotsConfig,
}

impl SeedConfig {
    /// Creates a new seed configuration with the specified number of departments.
    pub fn new(num_departments: usize) -> Self {
        Self {
            num_departments,
            ..Default::default()
        }
    }

    pub fn with_catalog(mut self, catalog: CatalogPerDepartment) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_slots(mut self, slots: SlotsConfig) -> Self {
        self.slots = slots;
        self
    }

    pub fn total_programs(&self) -> usize {
        self.num_departments * self.catalog.programs
    }

    pub fn total_courses(&self) -> usize {
        self.total_programs() * self.catalog.courses_per_program
    }

    pub fn total_slots(&self) -> usize {
        self.slots.days * self.slots.times.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_totals() {
        let config = SeedConfig::new(2).with_catalog(CatalogPerDepartment {
            programs: 4,
            teachers: 3,
            courses_per_program: 5,
        });
        assert_eq!(config.total_programs(), 8);
        assert_eq!(config.total_courses(), 40);
        assert_eq!(config.total_slots(), 30);
    }
}
