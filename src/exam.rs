use crate::classroom::Classroom;
use crate::course::Course;
use chrono::{Duration, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A (date, start, end) triple. Start is always strictly before end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExamSlot {
    date: NaiveDate,
    start: NaiveTime,
    end: NaiveTime,
}

impl ExamSlot {
    /// Returns `None` unless `start < end`.
    pub fn new(date: NaiveDate, start: NaiveTime, end: NaiveTime) -> Option<Self> {
        (start < end).then_some(Self { date, start, end })
    }

    /// Slot of `duration_minutes` beginning at `start`. Fails for a
    /// non-positive duration or one that runs past midnight.
    pub fn starting_at(date: NaiveDate, start: NaiveTime, duration_minutes: i64) -> Option<Self> {
        if duration_minutes <= 0 {
            return None;
        }
        let (end, wrapped_secs) = start.overflowing_add_signed(Duration::minutes(duration_minutes));
        if wrapped_secs != 0 {
            return None;
        }
        Self::new(date, start, end)
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    pub fn overlaps(&self, other: &ExamSlot) -> bool {
        self.date == other.date && self.start < other.end && other.start < self.end
    }

    /// Minutes from the end of `self` to the start of `later`; negative when
    /// `later` starts before `self` ends.
    pub fn minutes_until(&self, later: &ExamSlot) -> i64 {
        (later.start - self.end).num_minutes()
    }
}

impl fmt::Display for ExamSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}-{}",
            self.date,
            self.start.format("%H:%M"),
            self.end.format("%H:%M")
        )
    }
}

/// One course sitting in one classroom during one slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exam {
    pub course: Course,
    pub classroom: Classroom,
    pub slot: ExamSlot,
}

impl Exam {
    pub fn new(course: Course, classroom: Classroom, slot: ExamSlot) -> Self {
        Self {
            course,
            classroom,
            slot,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.slot.date()
    }
}

impl fmt::Display for Exam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} in {} at {}",
            self.course.code, self.classroom.id, self.slot
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn slot_requires_start_before_end() {
        assert!(ExamSlot::new(d(2025, 1, 6), t(10, 0), t(10, 0)).is_none());
        assert!(ExamSlot::new(d(2025, 1, 6), t(11, 0), t(10, 0)).is_none());
        assert!(ExamSlot::new(d(2025, 1, 6), t(10, 0), t(11, 0)).is_some());
    }

    #[test]
    fn starting_at_rejects_midnight_wrap_and_empty_duration() {
        assert!(ExamSlot::starting_at(d(2025, 1, 6), t(23, 0), 120).is_none());
        assert!(ExamSlot::starting_at(d(2025, 1, 6), t(9, 0), 0).is_none());
        let slot = ExamSlot::starting_at(d(2025, 1, 6), t(9, 0), 90).unwrap();
        assert_eq!(slot.end(), t(10, 30));
        assert_eq!(slot.duration_minutes(), 90);
    }

    #[test]
    fn overlap_is_date_aware_and_half_open() {
        let a = ExamSlot::new(d(2025, 1, 6), t(10, 0), t(12, 0)).unwrap();
        let b = ExamSlot::new(d(2025, 1, 6), t(11, 0), t(13, 0)).unwrap();
        let touching = ExamSlot::new(d(2025, 1, 6), t(12, 0), t(14, 0)).unwrap();
        let other_day = ExamSlot::new(d(2025, 1, 7), t(10, 0), t(12, 0)).unwrap();

        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&touching));
        assert!(!a.overlaps(&other_day));
    }

    #[test]
    fn minutes_until_is_directed() {
        let a = ExamSlot::new(d(2025, 1, 6), t(9, 0), t(11, 0)).unwrap();
        let b = ExamSlot::new(d(2025, 1, 6), t(14, 0), t(16, 0)).unwrap();
        assert_eq!(a.minutes_until(&b), 180);
        assert_eq!(b.minutes_until(&a), -420);
    }
}
