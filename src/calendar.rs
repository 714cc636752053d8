use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Which calendar days may host exams, counted from the first exam day.
#[derive(Debug, Clone, PartialEq)]
pub struct ExamCalendar {
    start: NaiveDate,
    blackout_dates: HashSet<NaiveDate>,
    excluded_weekdays: HashSet<Weekday>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamCalendarConfig {
    #[serde(default)]
    excluded_weekdays: Vec<Weekday>,
    #[serde(default)]
    blackout_dates: Vec<NaiveDate>,
}

impl ExamCalendar {
    const ALL_WEEKDAYS: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];

    /// Every day from `start` onwards is usable.
    pub fn new(start: NaiveDate) -> Self {
        Self {
            start,
            blackout_dates: HashSet::new(),
            excluded_weekdays: HashSet::new(),
        }
    }

    pub fn from_config(start: NaiveDate, config: &ExamCalendarConfig) -> Self {
        Self {
            start,
            blackout_dates: config.blackout_dates.iter().copied().collect(),
            excluded_weekdays: config.excluded_weekdays.iter().copied().collect(),
        }
    }

    pub fn to_config(&self) -> ExamCalendarConfig {
        ExamCalendarConfig::from(self)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn add_blackout(&mut self, date: NaiveDate) {
        self.blackout_dates.insert(date);
    }

    pub fn add_blackouts(&mut self, dates: &[NaiveDate]) {
        self.blackout_dates.extend(dates);
    }

    /// Restrict exams to the given weekdays (e.g. Mon-Fri).
    pub fn set_exam_weekdays(&mut self, days: &[Weekday]) {
        self.excluded_weekdays.clear();
        for day in Self::ALL_WEEKDAYS {
            if !days.contains(&day) {
                self.excluded_weekdays.insert(day);
            }
        }
    }

    pub fn is_available(&self, date: NaiveDate) -> bool {
        date >= self.start
            && !self.blackout_dates.contains(&date)
            && !self.excluded_weekdays.contains(&date.weekday())
    }

    /// Usable dates among the first `day_count` calendar days. Stops early
    /// at the end of the representable calendar.
    pub fn exam_dates(&self, day_count: usize) -> Vec<NaiveDate> {
        let mut dates = Vec::new();
        let mut current = Some(self.start);
        for _ in 0..day_count {
            let Some(date) = current else {
                break;
            };
            if self.is_available(date) {
                dates.push(date);
            }
            current = date.checked_add_days(Days::new(1));
        }
        dates
    }

    /// Number of calendar days from the start through `end` inclusive, or
    /// `None` when `end` precedes the start.
    pub fn span_through(&self, end: NaiveDate) -> Option<usize> {
        let days = (end - self.start).num_days();
        usize::try_from(days).ok().map(|d| d + 1)
    }

    /// Last calendar day covered by `day_count` days, capped at the last
    /// representable date.
    pub fn last_day(&self, day_count: usize) -> NaiveDate {
        let offset = day_count.saturating_sub(1) as u64;
        self.start
            .checked_add_days(Days::new(offset))
            .unwrap_or(NaiveDate::MAX)
    }
}

impl ExamCalendarConfig {
    pub fn new<I, J>(excluded_weekdays: I, blackout_dates: J) -> Self
    where
        I: IntoIterator<Item = Weekday>,
        J: IntoIterator<Item = NaiveDate>,
    {
        let mut excluded: Vec<Weekday> = excluded_weekdays.into_iter().collect();
        excluded.sort_by_key(|wd| wd.num_days_from_monday());
        excluded.dedup();

        let mut blackout: Vec<NaiveDate> = blackout_dates.into_iter().collect();
        blackout.sort();
        blackout.dedup();

        Self {
            excluded_weekdays: excluded,
            blackout_dates: blackout,
        }
    }

    pub fn excluded_weekdays(&self) -> &[Weekday] {
        &self.excluded_weekdays
    }

    pub fn blackout_dates(&self) -> &[NaiveDate] {
        &self.blackout_dates
    }

    pub fn excludes_every_weekday(&self) -> bool {
        ExamCalendar::ALL_WEEKDAYS
            .iter()
            .all(|day| self.excluded_weekdays.contains(day))
    }
}

impl From<&ExamCalendar> for ExamCalendarConfig {
    fn from(calendar: &ExamCalendar) -> Self {
        ExamCalendarConfig::new(
            calendar.excluded_weekdays.iter().copied(),
            calendar.blackout_dates.iter().copied(),
        )
    }
}
