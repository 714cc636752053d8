use crate::timetable::ExamTimetable;
use serde::{Deserialize, Serialize};

/// Alternatives generated beyond the optimal day count.
pub const MAX_ALTERNATIVES: usize = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleOption {
    pub days: usize,
    pub is_optimal: bool,
    pub timetable: ExamTimetable,
}

/// The optimal timetable first, then looser ones spread over more days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleOptions {
    pub optimal_days: usize,
    pub options: Vec<ScheduleOption>,
}

impl ScheduleOptions {
    pub fn optimal(&self) -> Option<&ScheduleOption> {
        self.options.iter().find(|option| option.is_optimal)
    }

    pub fn alternatives(&self) -> impl Iterator<Item = &ScheduleOption> {
        self.options.iter().filter(|option| !option.is_optimal)
    }

    pub fn for_days(&self, days: usize) -> Option<&ScheduleOption> {
        self.options.iter().find(|option| option.days == days)
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}
