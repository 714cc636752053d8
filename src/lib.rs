pub mod calendar;
pub mod classroom;
pub mod config;
pub mod constraints;
pub mod course;
pub mod error;
pub mod exam;
pub mod scheduler;
pub mod state;
pub mod timetable;
pub mod validation;

pub use calendar::{ExamCalendar, ExamCalendarConfig};
pub use classroom::Classroom;
pub use config::{
    ClassroomOrder, DailyWindow, SchedulerConfig, load_config_from_json, save_config_to_json,
};
pub use constraints::{ConstraintChecker, FlatSchedule, ScheduleView, Violation};
pub use course::{Course, CourseRoster, Enrollment, Student};
pub use error::{ConfigError, SchedulerError, SchedulerResult};
pub use exam::{Exam, ExamSlot};
pub use scheduler::{
    DayOrder, Horizon, ProbeRecord, ProbeStatus, ScheduleOption, ScheduleOptions,
    ScheduleRequest, Scheduler, SearchSummary,
};
pub use state::ScheduleState;
pub use timetable::{ExamTimetable, TimetableIssue};
