pub use registrar_models::teachers::{
    CreateTeacherDto, Teacher, TeacherEmailParams, UpdateTeacherDto, full_name,
};
