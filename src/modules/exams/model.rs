pub use registrar_models::exams::{
    CreateExamDto, ExamClash, ExamFilterParams, ExamTimetable, ExamTimetableDetails,
    UpdateExamDto, find_exam_clash,
};
