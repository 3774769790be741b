pub use registrar_models::dashboard::{StudentStats, TeacherStats};
