pub mod admissions;
pub mod announcements;
pub mod courses;
pub mod dashboard;
pub mod departments;
pub mod events;
pub mod exams;
pub mod files;
pub mod levels;
pub mod programs;
pub mod results;
pub mod students;
pub mod teachers;
pub mod timetables;
pub mod users;

pub use self::users::model::User;
