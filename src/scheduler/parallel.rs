//! Day-count search that probes several day counts at once.
//!
//! Each round spreads up to one probe per rayon worker over the open range.
//! The smallest success of a round lowers the upper end, the largest failure
//! below it raises the lower end. A success is published as soon as its probe
//! returns, so sibling probes at larger day counts stop early.

use super::search::{DayOrder, Problem, ProbeOutcome};
use super::summary::SearchSummary;
use crate::exam::Exam;
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

pub(crate) fn minimize_days(
    problem: &Problem<'_>,
    lower: usize,
    upper: usize,
    summary: &mut SearchSummary,
) -> Option<(usize, Vec<Exam>)> {
    let width = rayon::current_num_threads().max(1);
    let best_known = AtomicUsize::new(usize::MAX);
    let mut best: Option<(usize, Vec<Exam>)> = None;
    let (mut low, mut high) = (lower, upper);

    while low <= high {
        let round = probe_points(low, high, width);
        debug!(?round, "probing day counts in parallel");

        let outcomes: Vec<ProbeOutcome> = round
            .par_iter()
            .map(|&days| probe_and_publish(problem, days, &best_known))
            .collect();

        let mut smallest_success: Option<usize> = None;
        for outcome in outcomes {
            let days = outcome.record.day_count;
            summary.record(outcome.record);
            if let Some(exams) = outcome.exams {
                if best.as_ref().is_none_or(|(current, _)| days < *current) {
                    best = Some((days, exams));
                }
                smallest_success = Some(smallest_success.map_or(days, |s| s.min(days)));
            }
        }

        match smallest_success {
            Some(success) => {
                if let Some(failure) = round.iter().copied().filter(|&d| d < success).max() {
                    low = failure + 1;
                }
                high = success - 1;
            }
            None => match round.last() {
                Some(&largest) => low = largest + 1,
                None => break,
            },
        }
    }
    best
}

/// Runs one probe and, on success, lowers `best_known` to its day count
/// before returning.
fn probe_and_publish(problem: &Problem<'_>, days: usize, best_known: &AtomicUsize) -> ProbeOutcome {
    let outcome = problem.probe(days, DayOrder::Chronological, Some(best_known));
    if outcome.exams.is_some() {
        best_known.fetch_min(days, Ordering::Relaxed);
    }
    outcome
}

/// Ascending, distinct day counts in `[low, high]`; the midpoint alone when
/// only one worker is available.
fn probe_points(low: usize, high: usize, width: usize) -> Vec<usize> {
    let span = high - low;
    if width <= 1 {
        return vec![low + span / 2];
    }
    if span < width {
        return (low..=high).collect();
    }
    let mut points: Vec<usize> = (0..width)
        .map(|i| low + span * i / (width - 1))
        .collect();
    points.dedup();
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::ExamCalendar;
    use crate::classroom::Classroom;
    use crate::config::SchedulerConfig;
    use crate::constraints::ConstraintChecker;
    use crate::course::{Course, CourseRoster, Enrollment, Student};
    use crate::scheduler::ProbeStatus;
    use chrono::NaiveDate;

    // One student, six courses, two exams a day: three days at least.
    fn six_courses() -> (Vec<Course>, Vec<Classroom>, Vec<Enrollment>) {
        let student = Student::new("S1", "Ali");
        let courses: Vec<Course> = (0..6)
            .map(|i| Course::new(format!("C{i}"), "Course", 60))
            .collect();
        let rooms = vec![Classroom::new("R1", "Room", 10)];
        let enrollments = courses
            .iter()
            .map(|course| Enrollment::new(student.clone(), course.clone()))
            .collect();
        (courses, rooms, enrollments)
    }

    fn build<'a>(
        courses: &'a [Course],
        rooms: &'a [Classroom],
        enrollments: &[Enrollment],
        config: &SchedulerConfig,
    ) -> Problem<'a> {
        Problem::new(
            courses,
            rooms,
            CourseRoster::from_enrollments(enrollments),
            ExamCalendar::new(NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()),
            ConstraintChecker::from_config(config),
            config,
        )
    }

    #[test]
    fn probe_points_cover_small_ranges() {
        assert_eq!(probe_points(3, 5, 8), vec![3, 4, 5]);
        assert_eq!(probe_points(1, 9, 1), vec![5]);
        assert_eq!(probe_points(1, 9, 3), vec![1, 5, 9]);
    }

    #[test]
    fn matches_sequential_minimum() {
        let (courses, rooms, enrollments) = six_courses();
        let config = SchedulerConfig::default();
        let problem = build(&courses, &rooms, &enrollments, &config);

        let mut summary = SearchSummary::new(1, 10);
        let (days, exams) = minimize_days(&problem, 1, 10, &mut summary).unwrap();
        assert_eq!(days, 3);
        assert_eq!(exams.len(), 6);
        assert_eq!(summary.optimal_days, Some(3));
    }

    #[test]
    fn success_cancels_larger_sibling_searches() {
        let (courses, rooms, enrollments) = six_courses();
        let config = SchedulerConfig::default();
        let problem = build(&courses, &rooms, &enrollments, &config);
        let best_known = AtomicUsize::new(usize::MAX);

        let winner = probe_and_publish(&problem, 3, &best_known);
        assert_eq!(winner.record.status, ProbeStatus::Success);
        assert_eq!(best_known.load(Ordering::Relaxed), 3);

        let sibling = probe_and_publish(&problem, 5, &best_known);
        assert_eq!(sibling.record.status, ProbeStatus::Cancelled);
        assert_eq!(sibling.record.attempts, 0);
        assert!(sibling.exams.is_none());
        assert_eq!(best_known.load(Ordering::Relaxed), 3);

        let smaller = probe_and_publish(&problem, 2, &best_known);
        assert_ne!(smaller.record.status, ProbeStatus::Cancelled);
        assert!(smaller.exams.is_none());
    }
}
