use crate::constraints::{ConstraintChecker, Violation};
use crate::course::{Course, Enrollment};
use crate::exam::Exam;
use crate::scheduler::SearchSummary;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// A finished assignment: one exam per course plus the enrollments it was
/// built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamTimetable {
    exams: Vec<Exam>,
    enrollments: Vec<Enrollment>,
    start_date: NaiveDate,
    day_count: usize,
    summary: SearchSummary,
}

/// Problem found when re-checking a timetable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimetableIssue {
    #[error("exam for {course} breaks a rule: {violation}")]
    Broken { course: String, violation: Violation },
    #[error("course {0} has enrolled students but no exam")]
    Missing(String),
    #[error("course {course} has {count} exams")]
    Duplicated { course: String, count: usize },
}

impl ExamTimetable {
    pub fn new(
        exams: Vec<Exam>,
        enrollments: Vec<Enrollment>,
        start_date: NaiveDate,
        day_count: usize,
        summary: SearchSummary,
    ) -> Self {
        Self {
            exams,
            enrollments,
            start_date,
            day_count,
            summary,
        }
    }

    /// Exams in placement order.
    pub fn exams(&self) -> &[Exam] {
        &self.exams
    }

    pub fn enrollments(&self) -> &[Enrollment] {
        &self.enrollments
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    /// Day count the timetable was found for.
    pub fn day_count(&self) -> usize {
        self.day_count
    }

    pub fn summary(&self) -> &SearchSummary {
        &self.summary
    }

    pub fn exam_for_course(&self, course_code: &str) -> Option<&Exam> {
        self.exams
            .iter()
            .find(|exam| exam.course.code == course_code)
    }

    pub fn exams_for_course(&self, course_code: &str) -> Vec<&Exam> {
        self.exams
            .iter()
            .filter(|exam| exam.course.code == course_code)
            .collect()
    }

    /// The student's exams sorted by date and start time.
    pub fn exams_for_student(&self, student_id: &str) -> Vec<&Exam> {
        let courses: BTreeSet<&str> = self
            .enrollments
            .iter()
            .filter(|enrollment| enrollment.student.id == student_id)
            .map(|enrollment| enrollment.course.code.as_str())
            .collect();
        let mut exams: Vec<&Exam> = self
            .exams
            .iter()
            .filter(|exam| courses.contains(exam.course.code.as_str()))
            .collect();
        exams.sort_by_key(|exam| (exam.slot.date(), exam.slot.start()));
        exams
    }

    /// Distinct exam dates, ascending.
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.exams
            .iter()
            .map(Exam::date)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.exams.iter().map(Exam::date).max()
    }

    /// Calendar days from the start date through the last exam, inclusive.
    pub fn day_span(&self) -> usize {
        self.last_date()
            .and_then(|last| usize::try_from((last - self.start_date).num_days()).ok())
            .map_or(0, |days| days + 1)
    }

    /// Exams sorted by date, start time and classroom.
    pub fn chronological(&self) -> Vec<&Exam> {
        let mut exams: Vec<&Exam> = self.exams.iter().collect();
        exams.sort_by(|a, b| {
            (a.slot.date(), a.slot.start(), &a.classroom.id)
                .cmp(&(b.slot.date(), b.slot.start(), &b.classroom.id))
        });
        exams
    }

    /// Re-checks every exam against the rest of the timetable and reports
    /// courses that have no exam or more than one. Only courses with at
    /// least one enrollment can be reported missing; use [`Self::audit`] to
    /// check against a full course list.
    pub fn violations(&self, checker: &ConstraintChecker) -> Vec<TimetableIssue> {
        let mut issues = Vec::new();

        let mut per_course: BTreeMap<&str, usize> = BTreeMap::new();
        for exam in &self.exams {
            *per_course.entry(exam.course.code.as_str()).or_insert(0) += 1;
        }
        for (course, count) in &per_course {
            if *count > 1 {
                issues.push(TimetableIssue::Duplicated {
                    course: course.to_string(),
                    count: *count,
                });
            }
        }
        let enrolled: BTreeSet<&str> = self
            .enrollments
            .iter()
            .map(|enrollment| enrollment.course.code.as_str())
            .collect();
        for course in enrolled {
            if !per_course.contains_key(course) {
                issues.push(TimetableIssue::Missing(course.to_string()));
            }
        }

        for exam in &self.exams {
            if let Some(violation) = checker.check_manual_move(exam, &self.exams, &self.enrollments) {
                issues.push(TimetableIssue::Broken {
                    course: exam.course.code.clone(),
                    violation,
                });
            }
        }
        issues
    }

    /// [`Self::violations`] plus a [`TimetableIssue::Missing`] for every
    /// listed course without an exam, enrolled or not.
    pub fn audit(&self, checker: &ConstraintChecker, courses: &[Course]) -> Vec<TimetableIssue> {
        let mut issues = self.violations(checker);
        let mut reported: BTreeSet<String> = issues
            .iter()
            .filter_map(|issue| match issue {
                TimetableIssue::Missing(course) => Some(course.clone()),
                _ => None,
            })
            .collect();
        for course in courses {
            if self.exam_for_course(&course.code).is_none() && reported.insert(course.code.clone()) {
                issues.push(TimetableIssue::Missing(course.code.clone()));
            }
        }
        issues
    }

    /// Replaces the exam of `exam.course` when the move breaks no rule.
    pub fn apply_move(&mut self, checker: &ConstraintChecker, exam: Exam) -> Result<(), Violation> {
        if let Some(violation) = checker.check_manual_move(&exam, &self.exams, &self.enrollments) {
            return Err(violation);
        }
        match self
            .exams
            .iter()
            .position(|existing| existing.course.code == exam.course.code)
        {
            Some(position) => self.exams[position] = exam,
            None => self.exams.push(exam),
        }
        Ok(())
    }
}
