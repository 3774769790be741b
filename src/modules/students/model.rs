pub use registrar_models::students::{
    AcademicRecord, AssignmentChange, HealthInfo, Placement, StatusEffect, Student,
    StudentFilterParams, StudentLevel, StudentStatus, StudentSummary, SubjectGrade,
    UpdateStatusDto, UpdateStudentAssignmentDto, status_effect,
};
