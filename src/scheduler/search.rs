//! Depth-first placement of every course for one fixed day count.

use super::summary::{ProbeRecord, ProbeStatus};
use crate::calendar::ExamCalendar;
use crate::classroom::Classroom;
use crate::config::{ClassroomOrder, SchedulerConfig};
use crate::constraints::ConstraintChecker;
use crate::course::{Course, CourseRoster};
use crate::exam::{Exam, ExamSlot};
use crate::state::ScheduleState;
use chrono::{Duration as ChronoDuration, NaiveDate, NaiveTime};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Order in which candidate dates are tried for each course.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayOrder {
    /// Earliest date first; packs exams towards the start.
    Chronological,
    /// Dates with the fewest exams so far first, ties by date.
    Spread,
}

/// Everything fixed across the probes of one generation run.
#[derive(Debug)]
pub(crate) struct Problem<'a> {
    /// Hardest first: most students, then longest.
    courses: Vec<&'a Course>,
    /// Per entry of `courses`, start times whose slot fits the window.
    start_times: Vec<Vec<NaiveTime>>,
    /// Per entry of `courses`, classrooms large enough, smallest first.
    classrooms: Vec<Vec<&'a Classroom>>,
    roster: CourseRoster,
    calendar: ExamCalendar,
    checker: ConstraintChecker,
    classroom_order: ClassroomOrder,
    timeout: Option<Duration>,
    attempt_budget: Option<u64>,
}

impl<'a> Problem<'a> {
    pub(crate) fn new(
        courses: &'a [Course],
        classrooms: &'a [Classroom],
        roster: CourseRoster,
        calendar: ExamCalendar,
        checker: ConstraintChecker,
        config: &SchedulerConfig,
    ) -> Self {
        let mut ordered: Vec<&'a Course> = courses.iter().collect();
        ordered.sort_by(|a, b| {
            roster
                .enrolled_count(&b.code)
                .cmp(&roster.enrolled_count(&a.code))
                .then(b.duration_minutes.cmp(&a.duration_minutes))
        });

        let mut by_capacity: Vec<&'a Classroom> = classrooms.iter().collect();
        by_capacity.sort_by_key(|room| room.capacity);

        let start_times: Vec<Vec<NaiveTime>> = ordered
            .iter()
            .map(|course| slot_starts(&checker, config.slot_step_minutes, course.duration_minutes))
            .collect();
        let eligible: Vec<Vec<&'a Classroom>> = ordered
            .iter()
            .map(|course| {
                let enrolled = roster.enrolled_count(&course.code);
                by_capacity
                    .iter()
                    .copied()
                    .filter(|room| room.fits(enrolled))
                    .collect()
            })
            .collect();

        let attempt_budget = (config.attempt_factor > 0).then(|| {
            (courses.len() as u64)
                .saturating_mul(classrooms.len() as u64)
                .saturating_mul(config.attempt_factor)
        });
        let timeout = (config.probe_timeout_ms > 0).then(|| config.probe_timeout());

        Self {
            courses: ordered,
            start_times,
            classrooms: eligible,
            roster,
            calendar,
            checker,
            classroom_order: config.classroom_order,
            timeout,
            attempt_budget,
        }
    }

    #[cfg(test)]
    fn course_order(&self) -> impl Iterator<Item = &'a Course> + '_ {
        self.courses.iter().copied()
    }

    /// Runs one backtracking search over the first `day_count` calendar
    /// days. When `best_known` drops to `day_count` or below the probe gives
    /// up with [`ProbeStatus::Cancelled`].
    pub(crate) fn probe(
        &self,
        day_count: usize,
        order: DayOrder,
        best_known: Option<&AtomicUsize>,
    ) -> ProbeOutcome {
        let started = Instant::now();
        let mut search = Backtracker::new(self, day_count, order, best_known, started);
        let status = search.run();
        let record = ProbeRecord {
            day_count,
            status,
            attempts: search.attempts,
            elapsed: started.elapsed(),
        };
        debug!(
            day_count,
            status = %record.status,
            attempts = record.attempts,
            elapsed_ms = record.elapsed.as_millis() as u64,
            "probe finished"
        );
        let exams = (status == ProbeStatus::Success).then(|| search.state.into_exams());
        ProbeOutcome { record, exams }
    }
}

#[derive(Debug)]
pub(crate) struct ProbeOutcome {
    pub record: ProbeRecord,
    /// Set only on success; one exam per course.
    pub exams: Option<Vec<Exam>>,
}

fn slot_starts(checker: &ConstraintChecker, step_minutes: i64, duration_minutes: i64) -> Vec<NaiveTime> {
    let window = checker.window;
    let mut starts = Vec::new();
    if step_minutes <= 0 || duration_minutes <= 0 {
        return starts;
    }
    let mut offset = 0;
    while offset + duration_minutes <= window.minutes() {
        starts.push(window.start + ChronoDuration::minutes(offset));
        offset += step_minutes;
    }
    starts
}

enum Step {
    Placed,
    Backtrack,
    Abort(ProbeStatus),
}

struct Backtracker<'p, 'a> {
    problem: &'p Problem<'a>,
    day_count: usize,
    dates: Vec<NaiveDate>,
    order: DayOrder,
    state: ScheduleState<'p>,
    status: ProbeStatus,
    deadline: Option<Instant>,
    best_known: Option<&'p AtomicUsize>,
    attempts: u64,
    usage: HashMap<&'a str, usize>,
}

impl<'p, 'a> Backtracker<'p, 'a> {
    fn new(
        problem: &'p Problem<'a>,
        day_count: usize,
        order: DayOrder,
        best_known: Option<&'p AtomicUsize>,
        started: Instant,
    ) -> Self {
        Self {
            problem,
            day_count,
            dates: problem.calendar.exam_dates(day_count),
            order,
            state: ScheduleState::new(&problem.roster),
            status: ProbeStatus::NotStarted,
            deadline: problem.timeout.map(|timeout| started + timeout),
            best_known,
            attempts: 0,
            usage: HashMap::new(),
        }
    }

    fn run(&mut self) -> ProbeStatus {
        self.status = ProbeStatus::Searching;
        self.status = match self.place(0) {
            Step::Placed => ProbeStatus::Success,
            Step::Backtrack => ProbeStatus::Exhausted,
            Step::Abort(status) => status,
        };
        self.status
    }

    fn interrupted(&self) -> Option<ProbeStatus> {
        if let Some(best) = self.best_known {
            if best.load(Ordering::Relaxed) <= self.day_count {
                return Some(ProbeStatus::Cancelled);
            }
        }
        if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Some(ProbeStatus::TimedOut);
        }
        None
    }

    fn place(&mut self, index: usize) -> Step {
        let problem = self.problem;
        if index == problem.courses.len() {
            return Step::Placed;
        }
        if let Some(status) = self.interrupted() {
            return Step::Abort(status);
        }

        let course = problem.courses[index];
        let starts = &problem.start_times[index];
        let classrooms = self.classroom_candidates(index);

        for date in self.date_candidates() {
            if let Some(status) = self.interrupted() {
                return Step::Abort(status);
            }
            for &start in starts {
                let Some(slot) = ExamSlot::starting_at(date, start, course.duration_minutes) else {
                    continue;
                };
                for &classroom in &classrooms {
                    if problem.attempt_budget.is_some_and(|budget| self.attempts >= budget) {
                        return Step::Abort(ProbeStatus::AttemptsExhausted);
                    }
                    self.attempts += 1;
                    if !problem
                        .checker
                        .check_candidate(course, classroom, &slot, &self.state)
                    {
                        continue;
                    }

                    self.state
                        .add(Exam::new(course.clone(), classroom.clone(), slot));
                    *self.usage.entry(classroom.id.as_str()).or_insert(0) += 1;

                    match self.place(index + 1) {
                        Step::Placed => return Step::Placed,
                        Step::Abort(status) => return Step::Abort(status),
                        Step::Backtrack => {}
                    }

                    self.state.remove_last();
                    if let Some(count) = self.usage.get_mut(classroom.id.as_str()) {
                        *count -= 1;
                    }
                }
            }
        }

        trace!(course = %course.code, depth = index, "backtracking");
        Step::Backtrack
    }

    fn date_candidates(&self) -> Vec<NaiveDate> {
        let mut dates = self.dates.clone();
        if self.order == DayOrder::Spread {
            dates.sort_by_key(|&date| (self.state.exam_count_on(date), date));
        }
        dates
    }

    fn classroom_candidates(&self, index: usize) -> Vec<&'a Classroom> {
        let mut rooms = self.problem.classrooms[index].clone();
        if self.problem.classroom_order == ClassroomOrder::BestFitLeastUsed {
            rooms.sort_by_key(|room| {
                (
                    room.capacity,
                    self.usage.get(room.id.as_str()).copied().unwrap_or(0),
                )
            });
        }
        rooms
    }
}
