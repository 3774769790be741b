pub use registrar_models::timetables::{
    CalendarEntry, CalendarParams, DaySchedule, DayScheduleInput, ScheduleError, TimeSlot,
    TimeSlotInput, Timetable, TimetableDto, TimetableLookupParams, Weekday, course_ids,
    find_clash, normalize_schedule, project_week,
};
