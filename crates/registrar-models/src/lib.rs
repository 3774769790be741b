//! # Registrar Models
//!
//! Entities, DTOs and the pure domain rules of the Registrar API.
//!
//! # Modules
//!
//! - [`ids`]: per-entity UUID newtypes
//! - [`value_types`]: `HH:MM` clock times and other validated primitives
//! - [`users`]: users, application stage and landing routes
//! - [`departments`], [`programs`], [`courses`], [`teachers`]: the catalog
//! - [`admissions`]: screening slots, documents, the application form
//! - [`students`]: student records, status effects and reassignment plans
//! - [`timetables`]: weekly schedules, clash detection, calendar projection
//! - [`exams`]: exam timetable entries and clash detection
//! - [`results`]: grade table and CGPA
//! - [`announcements`], [`events`]: broadcasts
//! - [`levels`], [`files`], [`dashboard`]: supporting read models
//!
//! # Example
//!
//! ```ignore
//! use registrar_models::results::{Assessment, Grade};
//!
//! let a = Assessment::grade(25.0, 47.0, 3);
//! assert_eq!(a.grade, Grade::A);
//! assert_eq!(a.grade_point, 15);
//! ```

pub mod admissions;
pub mod announcements;
pub mod courses;
pub mod dashboard;
pub mod departments;
pub mod events;
pub mod exams;
pub mod files;
pub mod ids;
pub mod levels;
pub mod programs;
pub mod results;
pub mod students;
pub mod teachers;
pub mod timetables;
pub mod users;
pub mod value_types;

pub use ids::*;
pub use value_types::{ClockTime, Sex, TimeRange, ValueTypeError};

pub use students::{StudentLevel, StudentStatus};
pub use users::User;
