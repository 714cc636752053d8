//! Hard constraints on exam placement.
//!
//! A single rule engine, [`ConstraintChecker::evaluate`], runs against any
//! [`ScheduleView`]. The search uses the incremental [`ScheduleState`]; a
//! manual edit of an existing timetable uses a [`FlatSchedule`] built from
//! the exam list. Rules are checked in a fixed order and the first failing
//! one is reported.

use crate::classroom::Classroom;
use crate::config::{
    DailyWindow, SchedulerConfig, DEFAULT_MAX_EXAMS_PER_DAY, DEFAULT_MIN_GAP_MINUTES,
};
use crate::course::{Course, CourseRoster, Enrollment, Student};
use crate::exam::{Exam, ExamSlot};
use crate::state::ScheduleState;
use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;

/// Why a placement was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("{slot} is outside the exam window {window_start}-{window_end}")]
    OutsideWindow {
        slot: ExamSlot,
        window_start: NaiveTime,
        window_end: NaiveTime,
    },
    #[error("{course} has {enrolled} students but classroom {classroom} seats {capacity}")]
    OverCapacity {
        course: String,
        classroom: String,
        enrolled: usize,
        capacity: usize,
    },
    #[error("classroom {classroom} is already taken by {other_course} at that time")]
    ClassroomOccupied {
        classroom: String,
        other_course: String,
    },
    #[error("student {student} already has {count} exam(s) on {date}")]
    DailyLimit {
        student: String,
        date: NaiveDate,
        count: usize,
    },
    #[error("student {student} would sit {other_course} at the same time")]
    StudentConflict {
        student: String,
        other_course: String,
    },
    /// The candidate starts too soon after one of the student's exams.
    #[error("student {student} gets only {gap} minutes after {other_course}")]
    GapTooShortAfter {
        student: String,
        other_course: String,
        gap: i64,
    },
    /// The candidate ends too soon before one of the student's exams.
    #[error("student {student} gets only {gap} minutes before {other_course}")]
    GapTooShortBefore {
        student: String,
        other_course: String,
        gap: i64,
    },
}

/// Read access the rule engine needs from a set of already placed exams.
pub trait ScheduleView {
    fn students_for_course(&self, course_code: &str) -> &[Student];

    fn exams_in_classroom_on<'a>(
        &'a self,
        classroom_id: &'a str,
        date: NaiveDate,
    ) -> impl Iterator<Item = &'a Exam> + 'a;

    fn exam_count_for_student_on(&self, student_id: &str, date: NaiveDate) -> usize;

    fn exams_for_student_on<'a>(
        &'a self,
        student_id: &'a str,
        date: NaiveDate,
    ) -> impl Iterator<Item = &'a Exam> + 'a;
}

impl ScheduleView for ScheduleState<'_> {
    fn students_for_course(&self, course_code: &str) -> &[Student] {
        self.roster().students_for_course(course_code)
    }

    fn exams_in_classroom_on<'a>(
        &'a self,
        classroom_id: &'a str,
        date: NaiveDate,
    ) -> impl Iterator<Item = &'a Exam> + 'a {
        self.exams_in_classroom_date(classroom_id, date)
    }

    fn exam_count_for_student_on(&self, student_id: &str, date: NaiveDate) -> usize {
        self.exams_count_for_student_date(student_id, date)
    }

    fn exams_for_student_on<'a>(
        &'a self,
        student_id: &'a str,
        date: NaiveDate,
    ) -> impl Iterator<Item = &'a Exam> + 'a {
        self.exams_for_student_date(student_id, date)
    }
}

/// Unindexed view over a plain exam list. Every query scans the list.
#[derive(Debug, Clone)]
pub struct FlatSchedule<'a> {
    roster: &'a CourseRoster,
    exams: Vec<&'a Exam>,
}

impl<'a> FlatSchedule<'a> {
    pub fn new<I>(roster: &'a CourseRoster, exams: I) -> Self
    where
        I: IntoIterator<Item = &'a Exam>,
    {
        Self {
            roster,
            exams: exams.into_iter().collect(),
        }
    }

    /// Every exam of `all_exams` except those of `course_code`.
    pub fn excluding_course(
        roster: &'a CourseRoster,
        all_exams: &'a [Exam],
        course_code: &str,
    ) -> Self {
        Self::new(
            roster,
            all_exams
                .iter()
                .filter(|exam| exam.course.code != course_code),
        )
    }

    pub fn len(&self) -> usize {
        self.exams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exams.is_empty()
    }
}

impl ScheduleView for FlatSchedule<'_> {
    fn students_for_course(&self, course_code: &str) -> &[Student] {
        self.roster.students_for_course(course_code)
    }

    fn exams_in_classroom_on<'b>(
        &'b self,
        classroom_id: &'b str,
        date: NaiveDate,
    ) -> impl Iterator<Item = &'b Exam> + 'b {
        self.exams
            .iter()
            .filter(move |exam| exam.classroom.id == classroom_id && exam.date() == date)
            .map(|exam| &**exam)
    }

    fn exam_count_for_student_on(&self, student_id: &str, date: NaiveDate) -> usize {
        self.exams_for_student_on(student_id, date).count()
    }

    fn exams_for_student_on<'b>(
        &'b self,
        student_id: &'b str,
        date: NaiveDate,
    ) -> impl Iterator<Item = &'b Exam> + 'b {
        self.exams
            .iter()
            .filter(move |exam| {
                exam.date() == date && self.roster.is_enrolled(student_id, &exam.course.code)
            })
            .map(|exam| &**exam)
    }
}

/// Thresholds are plain public fields; adjust them between calls as needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstraintChecker {
    pub min_gap_minutes: i64,
    pub max_exams_per_day: usize,
    pub window: DailyWindow,
}

impl Default for ConstraintChecker {
    fn default() -> Self {
        Self {
            min_gap_minutes: DEFAULT_MIN_GAP_MINUTES,
            max_exams_per_day: DEFAULT_MAX_EXAMS_PER_DAY,
            window: DailyWindow::default(),
        }
    }
}

impl From<&SchedulerConfig> for ConstraintChecker {
    fn from(config: &SchedulerConfig) -> Self {
        Self::from_config(config)
    }
}

impl ConstraintChecker {
    pub fn new(min_gap_minutes: i64, max_exams_per_day: usize, window: DailyWindow) -> Self {
        Self {
            min_gap_minutes,
            max_exams_per_day,
            window,
        }
    }

    pub fn from_config(config: &SchedulerConfig) -> Self {
        Self::new(
            config.min_gap_minutes,
            config.max_exams_per_day,
            config.window(),
        )
    }

    /// Order: window, capacity, classroom, then per student the daily count
    /// followed by overlap and gap against each of their exams that day.
    pub fn evaluate<V: ScheduleView>(
        &self,
        course: &Course,
        classroom: &Classroom,
        slot: &ExamSlot,
        view: &V,
    ) -> Result<(), Violation> {
        if !self.window.contains(slot.start(), slot.end()) {
            return Err(Violation::OutsideWindow {
                slot: *slot,
                window_start: self.window.start,
                window_end: self.window.end,
            });
        }

        let students = view.students_for_course(&course.code);
        if !classroom.fits(students.len()) {
            return Err(Violation::OverCapacity {
                course: course.code.clone(),
                classroom: classroom.id.clone(),
                enrolled: students.len(),
                capacity: classroom.capacity,
            });
        }

        if let Some(taken) = view
            .exams_in_classroom_on(&classroom.id, slot.date())
            .find(|existing| existing.slot.overlaps(slot))
        {
            return Err(Violation::ClassroomOccupied {
                classroom: classroom.id.clone(),
                other_course: taken.course.code.clone(),
            });
        }

        for student in students {
            self.check_student(student, slot, view)?;
        }
        Ok(())
    }

    fn check_student<V: ScheduleView>(
        &self,
        student: &Student,
        slot: &ExamSlot,
        view: &V,
    ) -> Result<(), Violation> {
        let count = view.exam_count_for_student_on(&student.id, slot.date());
        if count >= self.max_exams_per_day {
            return Err(Violation::DailyLimit {
                student: student.id.clone(),
                date: slot.date(),
                count,
            });
        }

        for existing in view.exams_for_student_on(&student.id, slot.date()) {
            if existing.slot.overlaps(slot) {
                return Err(Violation::StudentConflict {
                    student: student.id.clone(),
                    other_course: existing.course.code.clone(),
                });
            }
            let after = existing.slot.minutes_until(slot);
            if after >= 0 && after < self.min_gap_minutes {
                return Err(Violation::GapTooShortAfter {
                    student: student.id.clone(),
                    other_course: existing.course.code.clone(),
                    gap: after,
                });
            }
            let before = slot.minutes_until(&existing.slot);
            if before >= 0 && before < self.min_gap_minutes {
                return Err(Violation::GapTooShortBefore {
                    student: student.id.clone(),
                    other_course: existing.course.code.clone(),
                    gap: before,
                });
            }
        }
        Ok(())
    }

    /// Whether `candidate` may be added to `state`.
    pub fn check_all(&self, candidate: &Exam, state: &ScheduleState<'_>) -> bool {
        self.evaluate(&candidate.course, &candidate.classroom, &candidate.slot, state)
            .is_ok()
    }

    /// Same as [`check_all`](Self::check_all) without building an [`Exam`].
    pub fn check_candidate(
        &self,
        course: &Course,
        classroom: &Classroom,
        slot: &ExamSlot,
        state: &ScheduleState<'_>,
    ) -> bool {
        self.evaluate(course, classroom, slot, state).is_ok()
    }

    /// Validates moving `new_exam.course` to `new_exam`'s classroom and slot.
    /// Every exam of that course in `all_exams` is ignored.
    pub fn check_manual_move(
        &self,
        new_exam: &Exam,
        all_exams: &[Exam],
        enrollments: &[Enrollment],
    ) -> Option<Violation> {
        let roster = CourseRoster::from_enrollments(enrollments);
        let others = FlatSchedule::excluding_course(&roster, all_exams, &new_exam.course.code);
        self.evaluate(&new_exam.course, &new_exam.classroom, &new_exam.slot, &others)
            .err()
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

    fn slot(h1: u32, m1: u32, h2: u32, m2: u32) -> ExamSlot {
        ExamSlot::new(d(2024, 3, 4), t(h1, m1), t(h2, m2)).unwrap()
    }

    struct Fixture {
        roster: CourseRoster,
        enrollments: Vec<Enrollment>,
        math: Course,
        physics: Course,
        chemistry: Course,
        hall: Classroom,
        lab: Classroom,
    }

    // S1 takes all three courses, S2 only physics.
    fn fixture() -> Fixture {
        let math = Course::new("MATH", "Mathematics", 120);
        let physics = Course::new("PHYS", "Physics", 120);
        let chemistry = Course::new("CHEM", "Chemistry", 60);
        let s1 = Student::new("S1", "Ali");
        let s2 = Student::new("S2", "Ayse");
        let enrollments = vec![
            Enrollment::new(s1.clone(), math.clone()),
            Enrollment::new(s1.clone(), physics.clone()),
            Enrollment::new(s1, chemistry.clone()),
            Enrollment::new(s2, physics.clone()),
        ];
        Fixture {
            roster: CourseRoster::from_enrollments(&enrollments),
            enrollments,
            math,
            physics,
            chemistry,
            hall: Classroom::new("HALL", "Main hall", 100),
            lab: Classroom::new("LAB", "Lab", 1),
        }
    }

    #[test]
    fn rejects_slot_outside_window() {
        let f = fixture();
        let state = ScheduleState::new(&f.roster);
        let checker = ConstraintChecker::default();

        let early = Exam::new(f.math.clone(), f.hall.clone(), slot(8, 30, 10, 30));
        let late = Exam::new(f.math.clone(), f.hall.clone(), slot(17, 0, 19, 0));
        let edge = Exam::new(f.math, f.hall, slot(16, 30, 18, 30));
        assert!(!checker.check_all(&early, &state));
        assert!(!checker.check_all(&late, &state));
        assert!(checker.check_all(&edge, &state));
    }

    #[test]
    fn rejects_classroom_too_small() {
        let f = fixture();
        let state = ScheduleState::new(&f.roster);
        let err = ConstraintChecker::default()
            .evaluate(&f.physics, &f.lab, &slot(9, 0, 11, 0), &state)
            .unwrap_err();
        assert_eq!(
            err,
            Violation::OverCapacity {
                course: "PHYS".into(),
                classroom: "LAB".into(),
                enrolled: 2,
                capacity: 1,
            }
        );
    }

    #[test]
    fn rejects_overlapping_classroom_use() {
        let f = fixture();
        let mut state = ScheduleState::new(&f.roster);
        state.add(Exam::new(f.math.clone(), f.hall.clone(), slot(9, 0, 11, 0)));

        let err = ConstraintChecker::default()
            .evaluate(&f.chemistry, &f.hall, &slot(10, 0, 11, 0), &state)
            .unwrap_err();
        assert!(matches!(err, Violation::ClassroomOccupied { .. }));
    }

    #[test]
    fn rejects_student_overlap_before_gap() {
        let f = fixture();
        let mut state = ScheduleState::new(&f.roster);
        state.add(Exam::new(f.math.clone(), f.hall.clone(), slot(9, 0, 11, 0)));

        let err = ConstraintChecker::default()
            .evaluate(&f.physics, &Classroom::new("B", "B", 10), &slot(10, 0, 12, 0), &state)
            .unwrap_err();
        assert_eq!(
            err,
            Violation::StudentConflict {
                student: "S1".into(),
                other_course: "MATH".into(),
            }
        );
    }

    #[test]
    fn enforces_minimum_gap_in_both_directions() {
        let f = fixture();
        let mut state = ScheduleState::new(&f.roster);
        let room = Classroom::new("B", "B", 10);
        state.add(Exam::new(f.math.clone(), f.hall.clone(), slot(12, 0, 14, 0)));
        let checker = ConstraintChecker::default();

        let after = checker
            .evaluate(&f.physics, &room, &slot(16, 0, 18, 0), &state)
            .unwrap_err();
        assert_eq!(
            after,
            Violation::GapTooShortAfter {
                student: "S1".into(),
                other_course: "MATH".into(),
                gap: 120,
            }
        );

        let before = checker
            .evaluate(&f.physics, &room, &slot(9, 0, 10, 0), &state)
            .unwrap_err();
        assert!(matches!(before, Violation::GapTooShortBefore { gap: 120, .. }));
    }

    #[test]
    fn gap_equal_to_minimum_is_accepted() {
        let f = fixture();
        let mut state = ScheduleState::new(&f.roster);
        state.add(Exam::new(f.math.clone(), f.hall.clone(), slot(9, 0, 11, 0)));
        let candidate = Exam::new(f.physics, Classroom::new("B", "B", 10), slot(14, 0, 16, 0));
        assert!(ConstraintChecker::default().check_all(&candidate, &state));
    }

    #[test]
    fn enforces_daily_limit() {
        let f = fixture();
        let mut state = ScheduleState::new(&f.roster);
        let mut checker = ConstraintChecker::default();
        checker.min_gap_minutes = 0;
        state.add(Exam::new(f.math.clone(), f.hall.clone(), slot(9, 0, 11, 0)));
        state.add(Exam::new(f.physics.clone(), f.hall.clone(), slot(11, 0, 13, 0)));

        let err = checker
            .evaluate(&f.chemistry, &f.hall, &slot(14, 0, 15, 0), &state)
            .unwrap_err();
        assert_eq!(
            err,
            Violation::DailyLimit {
                student: "S1".into(),
                date: d(2024, 3, 4),
                count: 2,
            }
        );

        checker.max_exams_per_day = 3;
        assert!(checker.check_candidate(&f.chemistry, &f.hall, &slot(14, 0, 15, 0), &state));
    }

    #[test]
    fn manual_move_ignores_the_moved_course() {
        let f = fixture();
        let exams = vec![
            Exam::new(f.math.clone(), f.hall.clone(), slot(9, 0, 11, 0)),
            Exam::new(f.physics.clone(), f.hall.clone(), slot(15, 0, 17, 0)),
        ];
        let checker = ConstraintChecker::default();

        // Moving MATH by an hour only overlaps its own old slot.
        let moved = Exam::new(f.math.clone(), f.hall.clone(), slot(10, 0, 12, 0));
        assert_eq!(checker.check_manual_move(&moved, &exams, &f.enrollments), None);

        let clash = Exam::new(f.math, f.hall, slot(16, 0, 18, 0));
        assert!(matches!(
            checker.check_manual_move(&clash, &exams, &f.enrollments),
            Some(Violation::ClassroomOccupied { .. })
        ));
    }

    #[test]
    fn manual_move_reports_rules_in_order() {
        let f = fixture();
        let exams = vec![Exam::new(f.math.clone(), f.hall.clone(), slot(9, 0, 11, 0))];
        let checker = ConstraintChecker::default();

        let outside = Exam::new(f.physics.clone(), f.lab.clone(), slot(7, 0, 9, 0));
        assert!(matches!(
            checker.check_manual_move(&outside, &exams, &f.enrollments),
            Some(Violation::OutsideWindow { .. })
        ));

        let gap = Exam::new(f.physics, Classroom::new("B", "B", 10), slot(12, 0, 14, 0));
        assert!(matches!(
            checker.check_manual_move(&gap, &exams, &f.enrollments),
            Some(Violation::GapTooShortAfter { gap: 60, .. })
        ));
    }

    #[test]
    fn flat_and_indexed_views_agree() {
        let f = fixture();
        let placed = vec![
            Exam::new(f.math.clone(), f.hall.clone(), slot(9, 0, 11, 0)),
            Exam::new(f.chemistry.clone(), f.hall.clone(), slot(14, 0, 15, 0)),
        ];
        let mut state = ScheduleState::new(&f.roster);
        for exam in &placed {
            state.add(exam.clone());
        }
        let flat = FlatSchedule::new(&f.roster, &placed);
        let checker = ConstraintChecker::default();
        let room = Classroom::new("B", "B", 10);

        for (h1, h2) in [(9, 11), (11, 13), (15, 17), (16, 18)] {
            let candidate = slot(h1, 0, h2, 0);
            assert_eq!(
                checker.evaluate(&f.physics, &room, &candidate, &state),
                checker.evaluate(&f.physics, &room, &candidate, &flat),
            );
        }
        assert_eq!(flat.exam_count_for_student_on("S1", d(2024, 3, 4)), 2);
        assert_eq!(flat.exam_count_for_student_on("S2", d(2024, 3, 4)), 0);
    }
}
