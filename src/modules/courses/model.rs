pub use registrar_models::courses::{
    Course, CourseFilterParams, CreateCourseDto, IdDiff, UpdateCourseDto, check_program_links,
    diff_ids,
};
