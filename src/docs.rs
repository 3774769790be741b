use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};

use registrar_core::{PaginationMeta, PaginationParams};

use crate::modules::admissions::model::{
    ApplicationDetails, ApplicationDocuments, ApplicationForm, CreateScreeningSlotDto,
    DocumentKind, DocumentLink, ScreeningReservation, ScreeningSlot, SubmitApplicationResponse,
};
use crate::modules::announcements::model::{
    Announcement, AnnouncementTarget, AnnouncementWithCreator, CreateAnnouncementDto,
};
use crate::modules::courses::model::{Course, CreateCourseDto, UpdateCourseDto};
use crate::modules::dashboard::model::{StudentStats, TeacherStats};
use crate::modules::departments::model::{
    CreateDepartmentDto, Department, DepartmentPromotion, DepartmentWithCounts,
    UpdateDepartmentDto,
};
use crate::modules::events::model::{CreateEventDto, Event, EventWithCreator};
use crate::modules::exams::model::{
    CreateExamDto, ExamTimetable, ExamTimetableDetails, UpdateExamDto,
};
use crate::modules::files::model::{FileUrlResponse, UploadedFileResponse};
use crate::modules::levels::model::{InitializeLevelsResponse, Level};
use crate::modules::programs::model::{
    CreateProgramDto, Program, ProgramCountDeltas, ProgramPromotion, PromoteProgramDto,
    UpdateProgramDto,
};
use crate::modules::results::model::{
    Cgpa, CourseResult, Grade, RecordResultDto, StudentResult,
};
use crate::modules::students::model::{
    Student, StudentLevel, StudentStatus, StudentSummary, UpdateStatusDto,
    UpdateStudentAssignmentDto,
};
use crate::modules::teachers::model::{CreateTeacherDto, Teacher, UpdateTeacherDto};
use crate::modules::timetables::model::{
    CalendarEntry, DaySchedule, TimeSlot, Timetable, TimetableDto, Weekday,
};
use crate::modules::users::model::{
    NavigationItem, NavigationResponse, RoleAndStatus, UpdateUserRoleDto, User,
};

/// Body of every error response.
#[derive(ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::users::controller::get_current_user,
        crate::modules::users::controller::sync_user,
        crate::modules::users::controller::get_role_and_status,
        crate::modules::users::controller::get_navigation,
        crate::modules::users::controller::list_users,
        crate::modules::users::controller::update_user_role,
        crate::modules::departments::controller::list_departments,
        crate::modules::departments::controller::get_department,
        crate::modules::departments::controller::create_department,
        crate::modules::departments::controller::update_department,
        crate::modules::departments::controller::delete_department,
        crate::modules::departments::controller::promote_department,
        crate::modules::programs::controller::list_programs,
        crate::modules::programs::controller::list_department_programs,
        crate::modules::programs::controller::get_program,
        crate::modules::programs::controller::create_program,
        crate::modules::programs::controller::update_program,
        crate::modules::programs::controller::delete_program,
        crate::modules::programs::controller::update_program_counts,
        crate::modules::programs::controller::promote_program,
        crate::modules::courses::controller::list_courses,
        crate::modules::courses::controller::get_course,
        crate::modules::courses::controller::list_program_courses,
        crate::modules::courses::controller::list_teacher_courses,
        crate::modules::courses::controller::create_course,
        crate::modules::courses::controller::update_course,
        crate::modules::courses::controller::delete_course,
        crate::modules::teachers::controller::list_teachers,
        crate::modules::teachers::controller::get_teacher,
        crate::modules::teachers::controller::get_teacher_by_email,
        crate::modules::teachers::controller::get_current_teacher,
        crate::modules::teachers::controller::create_teacher,
        crate::modules::teachers::controller::update_teacher,
        crate::modules::teachers::controller::delete_teacher,
        crate::modules::students::controller::list_students,
        crate::modules::students::controller::get_student,
        crate::modules::students::controller::update_student_status,
        crate::modules::students::controller::update_student_assignment,
        crate::modules::admissions::controller::submit_application,
        crate::modules::admissions::controller::get_my_application,
        crate::modules::admissions::controller::list_applicants,
        crate::modules::admissions::controller::get_application,
        crate::modules::admissions::controller::replace_generated_pdf,
        crate::modules::admissions::controller::list_screening_slots,
        crate::modules::admissions::controller::add_screening_slot,
        crate::modules::admissions::controller::get_next_available_slot,
        crate::modules::admissions::controller::reserve_screening_slot,
        crate::modules::timetables::controller::list_timetables,
        crate::modules::timetables::controller::find_timetable,
        crate::modules::timetables::controller::get_timetable,
        crate::modules::timetables::controller::get_timetable_calendar,
        crate::modules::timetables::controller::create_timetable,
        crate::modules::timetables::controller::update_timetable,
        crate::modules::timetables::controller::delete_timetable,
        crate::modules::exams::controller::list_exams,
        crate::modules::exams::controller::list_my_exams,
        crate::modules::exams::controller::list_teacher_exams,
        crate::modules::exams::controller::get_exam,
        crate::modules::exams::controller::create_exam,
        crate::modules::exams::controller::update_exam,
        crate::modules::exams::controller::delete_exam,
        crate::modules::results::controller::record_result,
        crate::modules::results::controller::list_results,
        crate::modules::results::controller::list_my_results,
        crate::modules::results::controller::get_my_cgpa,
        crate::modules::results::controller::list_student_results,
        crate::modules::results::controller::get_student_cgpa,
        crate::modules::results::controller::list_my_entered_results,
        crate::modules::results::controller::list_teacher_results,
        crate::modules::announcements::controller::create_announcement,
        crate::modules::announcements::controller::list_announcements,
        crate::modules::events::controller::create_event,
        crate::modules::events::controller::list_events,
        crate::modules::levels::controller::list_levels,
        crate::modules::levels::controller::initialize_levels,
        crate::modules::files::controller::upload_file,
        crate::modules::files::controller::get_file_url,
        crate::modules::dashboard::controller::get_student_stats,
        crate::modules::dashboard::controller::get_teacher_stats,
    ),
    components(
        schemas(
            ErrorResponse,
            PaginationMeta,
            PaginationParams,
            User,
            RoleAndStatus,
            NavigationItem,
            NavigationResponse,
            UpdateUserRoleDto,
            Department,
            DepartmentWithCounts,
            DepartmentPromotion,
            CreateDepartmentDto,
            UpdateDepartmentDto,
            Program,
            ProgramPromotion,
            ProgramCountDeltas,
            PromoteProgramDto,
            CreateProgramDto,
            UpdateProgramDto,
            Course,
            CreateCourseDto,
            UpdateCourseDto,
            Teacher,
            CreateTeacherDto,
            UpdateTeacherDto,
            Student,
            StudentSummary,
            StudentStatus,
            StudentLevel,
            UpdateStatusDto,
            UpdateStudentAssignmentDto,
            ApplicationForm,
            ApplicationDetails,
            ApplicationDocuments,
            DocumentKind,
            DocumentLink,
            SubmitApplicationResponse,
            ScreeningSlot,
            ScreeningReservation,
            CreateScreeningSlotDto,
            Timetable,
            TimetableDto,
            DaySchedule,
            TimeSlot,
            Weekday,
            CalendarEntry,
            ExamTimetable,
            ExamTimetableDetails,
            CreateExamDto,
            UpdateExamDto,
            CourseResult,
            StudentResult,
            RecordResultDto,
            Grade,
            Cgpa,
            Announcement,
            AnnouncementTarget,
            AnnouncementWithCreator,
            CreateAnnouncementDto,
            Event,
            EventWithCreator,
            CreateEventDto,
            Level,
            InitializeLevelsResponse,
            UploadedFileResponse,
            FileUrlResponse,
            StudentStats,
            TeacherStats,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Users", description = "Identity, roles and navigation"),
        (name = "Departments", description = "Departments and department-wide promotion"),
        (name = "Programs", description = "Programs and their level counters"),
        (name = "Courses", description = "Course catalog"),
        (name = "Teachers", description = "Teaching staff"),
        (name = "Students", description = "Student records, admission decisions and reassignment"),
        (name = "Admissions", description = "Applications and screening slots"),
        (name = "Timetables", description = "Weekly class timetables"),
        (name = "Exams", description = "Exam timetables"),
        (name = "Results", description = "Course results and CGPA"),
        (name = "Announcements", description = "Role-targeted announcements"),
        (name = "Events", description = "School events"),
        (name = "Levels", description = "Reference levels"),
        (name = "Files", description = "File uploads"),
        (name = "Dashboard", description = "Admin dashboard statistics")
    ),
    info(
        title = "Registrar API",
        version = "0.1.0",
        description = "Admissions, catalog, scheduling and grading API built with Rust, Axum, and PostgreSQL.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}
