//! Day-count minimizing exam scheduler.
//!
//! Generation runs in three steps. A cheap lower bound on the number of
//! exam days is computed first. A binary search over day counts between
//! that bound and the request's ceiling follows, and each probed day count
//! runs a depth-first placement search bounded by a timeout and an attempt
//! budget. The smallest day count whose search succeeds wins.

mod bounds;
mod options;
#[cfg(feature = "parallel")]
mod parallel;
mod search;
mod summary;

pub use bounds::lower_bound;
pub use options::{MAX_ALTERNATIVES, ScheduleOption, ScheduleOptions};
pub use search::DayOrder;
pub use summary::{ProbeRecord, ProbeStatus, SearchSummary};

use crate::calendar::ExamCalendar;
use crate::classroom::Classroom;
use crate::config::SchedulerConfig;
use crate::constraints::ConstraintChecker;
use crate::course::{Course, CourseRoster, Enrollment};
use crate::error::{SchedulerError, SchedulerResult};
use crate::exam::Exam;
use crate::timetable::ExamTimetable;
use crate::validation;
use chrono::{Local, NaiveDate};
use search::Problem;
use tracing::{debug, info, warn};

/// Last day exams may be placed on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Horizon {
    /// Use the scheduler's `max_days`.
    #[default]
    Configured,
    /// At most this many calendar days, counted from the start date.
    Days(usize),
    /// Through this date, inclusive.
    EndDate(NaiveDate),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleRequest {
    pub courses: Vec<Course>,
    pub classrooms: Vec<Classroom>,
    pub enrollments: Vec<Enrollment>,
    pub start_date: NaiveDate,
    pub horizon: Horizon,
    /// Dates skipped in addition to the configured calendar.
    pub blackout_dates: Vec<NaiveDate>,
    pub min_gap_minutes: Option<i64>,
    pub max_exams_per_day: Option<usize>,
}

impl ScheduleRequest {
    pub fn new(
        courses: Vec<Course>,
        classrooms: Vec<Classroom>,
        enrollments: Vec<Enrollment>,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            courses,
            classrooms,
            enrollments,
            start_date,
            horizon: Horizon::Configured,
            blackout_dates: Vec::new(),
            min_gap_minutes: None,
            max_exams_per_day: None,
        }
    }

    pub fn with_end_date(mut self, end: NaiveDate) -> Self {
        self.horizon = Horizon::EndDate(end);
        self
    }

    pub fn with_day_count(mut self, days: usize) -> Self {
        self.horizon = Horizon::Days(days);
        self
    }

    pub fn with_blackout_dates(mut self, dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        self.blackout_dates.extend(dates);
        self
    }

    pub fn with_min_gap_minutes(mut self, minutes: i64) -> Self {
        self.min_gap_minutes = Some(minutes);
        self
    }

    pub fn with_max_exams_per_day(mut self, count: usize) -> Self {
        self.max_exams_per_day = Some(count);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    config: SchedulerConfig,
}

/// Result of the day-count search, kept around so alternatives can reuse
/// the prepared problem.
struct Solved<'a> {
    problem: Problem<'a>,
    ceiling: usize,
    day_count: usize,
    exams: Vec<Exam>,
    summary: SearchSummary,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: SchedulerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut SchedulerConfig {
        &mut self.config
    }

    /// Checker with the request's threshold overrides applied.
    pub fn checker_for(&self, request: &ScheduleRequest) -> ConstraintChecker {
        let mut checker = ConstraintChecker::from_config(&self.config);
        if let Some(gap) = request.min_gap_minutes {
            checker.min_gap_minutes = gap;
        }
        if let Some(limit) = request.max_exams_per_day {
            checker.max_exams_per_day = limit;
        }
        checker
    }

    pub fn calendar_for(&self, request: &ScheduleRequest) -> ExamCalendar {
        let mut calendar = ExamCalendar::from_config(request.start_date, &self.config.calendar);
        calendar.add_blackouts(&request.blackout_dates);
        calendar
    }

    /// Largest day count the search may probe.
    pub fn ceiling_for(&self, request: &ScheduleRequest) -> SchedulerResult<usize> {
        match request.horizon {
            Horizon::Configured => Ok(self.config.max_days),
            Horizon::Days(days) => Ok(days),
            Horizon::EndDate(end) => ExamCalendar::new(request.start_date)
                .span_through(end)
                .ok_or_else(|| {
                    SchedulerError::invalid(format!(
                        "end date {} is before start date {}",
                        end, request.start_date
                    ))
                }),
        }
    }

    /// Timetable using the fewest calendar days found by the search.
    pub fn generate(&self, request: &ScheduleRequest) -> SchedulerResult<ExamTimetable> {
        let solved = self.solve(request)?;
        Ok(ExamTimetable::new(
            solved.exams,
            request.enrollments.clone(),
            request.start_date,
            solved.day_count,
            solved.summary,
        ))
    }

    /// The optimal timetable followed by up to [`MAX_ALTERNATIVES`]
    /// timetables using one, two, ... more days, each spreading exams
    /// towards the emptiest days. Day counts above the ceiling are skipped.
    pub fn generate_with_options(&self, request: &ScheduleRequest) -> SchedulerResult<ScheduleOptions> {
        let solved = self.solve(request)?;
        let optimal_days = solved.day_count;
        let mut options = Vec::with_capacity(MAX_ALTERNATIVES + 1);

        let last = optimal_days
            .saturating_add(MAX_ALTERNATIVES)
            .min(solved.ceiling);
        for days in optimal_days + 1..=last {
            let outcome = solved.problem.probe(days, DayOrder::Spread, None);
            let mut summary = SearchSummary::new(days, days);
            summary.record(outcome.record);
            match outcome.exams {
                Some(exams) => options.push(ScheduleOption {
                    days,
                    is_optimal: false,
                    timetable: ExamTimetable::new(
                        exams,
                        request.enrollments.clone(),
                        request.start_date,
                        days,
                        summary,
                    ),
                }),
                None => debug!(days, "no alternative timetable"),
            }
        }

        options.insert(
            0,
            ScheduleOption {
                days: optimal_days,
                is_optimal: true,
                timetable: ExamTimetable::new(
                    solved.exams,
                    request.enrollments.clone(),
                    request.start_date,
                    optimal_days,
                    solved.summary,
                ),
            },
        );
        info!(optimal_days, options = options.len(), "schedule options ready");
        Ok(ScheduleOptions {
            optimal_days,
            options,
        })
    }

    fn solve<'a>(&self, request: &'a ScheduleRequest) -> SchedulerResult<Solved<'a>> {
        validation::validate_request(request)?;
        let ceiling = self.ceiling_for(request)?;
        let checker = self.checker_for(request);
        let calendar = self.calendar_for(request);
        let roster = CourseRoster::from_enrollments(&request.enrollments);

        if request.start_date < Local::now().date_naive() {
            warn!(start = %request.start_date, "exam period starts in the past");
        }

        let lower = lower_bound(
            &request.courses,
            request.classrooms.len(),
            checker.window.minutes(),
            &roster,
            checker.max_exams_per_day,
            self.config.lower_bound_margin,
        );
        info!(
            courses = request.courses.len(),
            classrooms = request.classrooms.len(),
            students = roster.student_count(),
            lower_bound = lower,
            ceiling,
            "generating exam timetable"
        );

        let mut summary = SearchSummary::new(lower, ceiling);
        if lower > ceiling {
            warn!(lower_bound = lower, ceiling, "lower bound exceeds the day ceiling");
            return Err(SchedulerError::Infeasible { ceiling, summary });
        }

        let problem = Problem::new(
            &request.courses,
            &request.classrooms,
            roster,
            calendar,
            checker,
            &self.config,
        );

        #[cfg(feature = "parallel")]
        let found = parallel::minimize_days(&problem, lower, ceiling, &mut summary);
        #[cfg(not(feature = "parallel"))]
        let found = binary_search_days(&problem, lower, ceiling, &mut summary);

        match found {
            Some((day_count, exams)) => {
                info!(day_count, summary = %summary.to_cli_summary(), "exam timetable found");
                Ok(Solved {
                    problem,
                    ceiling,
                    day_count,
                    exams,
                    summary,
                })
            }
            None => {
                if summary.any_budget_exceeded() {
                    warn!(
                        summary = %summary.to_cli_summary(),
                        "search budget ran out before a timetable was found"
                    );
                }
                Err(SchedulerError::Infeasible { ceiling, summary })
            }
        }
    }
}

/// Classic binary search: a success moves the upper end below the probed
/// count, any other outcome moves the lower end above it.
#[cfg_attr(feature = "parallel", allow(dead_code))]
fn binary_search_days(
    problem: &Problem<'_>,
    lower: usize,
    upper: usize,
    summary: &mut SearchSummary,
) -> Option<(usize, Vec<Exam>)> {
    let (mut low, mut high) = (lower.max(1), upper);
    let mut best = None;
    while low <= high {
        let mid = low + (high - low) / 2;
        let outcome = problem.probe(mid, DayOrder::Chronological, None);
        if outcome.record.status.is_budget_exceeded() {
            warn!(day_count = mid, status = %outcome.record.status, "probe gave up");
        }
        summary.record(outcome.record);
        match outcome.exams {
            Some(exams) => {
                best = Some((mid, exams));
                high = mid - 1;
            }
            None => low = mid + 1,
        }
    }
    best
}
