//! Incremental index over the exams placed so far during one search probe.
//!
//! Every query used by the constraint checker in the innermost search loop
//! runs in time independent of the total number of placed exams: per
//! student and date we keep the positions of that student's exams, per
//! classroom and date the positions of the exams held there.
//!
//! Mutation follows a strict stack discipline. `remove_last` reverts exactly
//! what the matching `add` recorded, so callers must pop in reverse push
//! order; the structure itself does not check this.

use crate::course::{CourseRoster, Student};
use crate::exam::{Exam, ExamSlot};
use chrono::NaiveDate;
use std::collections::HashMap;

type DateIndex = HashMap<NaiveDate, Vec<usize>>;

#[derive(Debug, Clone)]
pub struct ScheduleState<'r> {
    roster: &'r CourseRoster,
    exams: Vec<Exam>,
    student_daily: HashMap<String, DateIndex>,
    classroom_daily: HashMap<String, DateIndex>,
    daily_totals: HashMap<NaiveDate, usize>,
}

impl<'r> ScheduleState<'r> {
    pub fn new(roster: &'r CourseRoster) -> Self {
        Self {
            roster,
            exams: Vec::new(),
            student_daily: HashMap::new(),
            classroom_daily: HashMap::new(),
            daily_totals: HashMap::new(),
        }
    }

    /// Cost is proportional to the number of students enrolled in the
    /// exam's course.
    pub fn add(&mut self, exam: Exam) {
        let position = self.exams.len();
        let date = exam.date();

        for student in self.roster.students_for_course(&exam.course.code) {
            push_index(&mut self.student_daily, &student.id, date, position);
        }
        push_index(&mut self.classroom_daily, &exam.classroom.id, date, position);
        *self.daily_totals.entry(date).or_insert(0) += 1;

        self.exams.push(exam);
    }

    pub fn remove_last(&mut self) -> Option<Exam> {
        let exam = self.exams.pop()?;
        let date = exam.date();

        for student in self.roster.students_for_course(&exam.course.code) {
            pop_index(&mut self.student_daily, &student.id, date);
        }
        pop_index(&mut self.classroom_daily, &exam.classroom.id, date);
        if let Some(total) = self.daily_totals.get_mut(&date) {
            *total -= 1;
            if *total == 0 {
                self.daily_totals.remove(&date);
            }
        }

        Some(exam)
    }

    pub fn exams(&self) -> &[Exam] {
        &self.exams
    }

    pub fn len(&self) -> usize {
        self.exams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exams.is_empty()
    }

    pub fn roster(&self) -> &'r CourseRoster {
        self.roster
    }

    pub fn students_for_course(&self, course_code: &str) -> &'r [Student] {
        self.roster.students_for_course(course_code)
    }

    pub fn exams_count_for_student_date(&self, student_id: &str, date: NaiveDate) -> usize {
        lookup(&self.student_daily, student_id, date).len()
    }

    pub fn exams_for_student_date<'a>(
        &'a self,
        student_id: &'a str,
        date: NaiveDate,
    ) -> impl Iterator<Item = &'a Exam> + 'a {
        lookup(&self.student_daily, student_id, date)
            .iter()
            .map(move |&position| &self.exams[position])
    }

    pub fn exams_in_classroom_date<'a>(
        &'a self,
        classroom_id: &'a str,
        date: NaiveDate,
    ) -> impl Iterator<Item = &'a Exam> + 'a {
        lookup(&self.classroom_daily, classroom_id, date)
            .iter()
            .map(move |&position| &self.exams[position])
    }

    pub fn is_classroom_available(&self, classroom_id: &str, slot: &ExamSlot) -> bool {
        !self
            .exams_in_classroom_date(classroom_id, slot.date())
            .any(|existing| existing.slot.overlaps(slot))
    }

    /// Number of exams (all classrooms) already placed on `date`.
    pub fn exam_count_on(&self, date: NaiveDate) -> usize {
        self.daily_totals.get(&date).copied().unwrap_or(0)
    }

    /// True when no index holds an entry. Always the case once every added
    /// exam has been removed again.
    pub fn indices_are_empty(&self) -> bool {
        self.student_daily.is_empty() && self.classroom_daily.is_empty() && self.daily_totals.is_empty()
    }

    pub fn into_exams(self) -> Vec<Exam> {
        self.exams
    }
}

fn lookup<'a>(index: &'a HashMap<String, DateIndex>, key: &str, date: NaiveDate) -> &'a [usize] {
    index
        .get(key)
        .and_then(|by_date| by_date.get(&date))
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn push_index(index: &mut HashMap<String, DateIndex>, key: &str, date: NaiveDate, position: usize) {
    if !index.contains_key(key) {
        index.insert(key.to_string(), DateIndex::new());
    }
    if let Some(by_date) = index.get_mut(key) {
        by_date.entry(date).or_default().push(position);
    }
}

fn pop_index(index: &mut HashMap<String, DateIndex>, key: &str, date: NaiveDate) {
    let Some(by_date) = index.get_mut(key) else {
        return;
    };
    if let Some(positions) = by_date.get_mut(&date) {
        positions.pop();
        if positions.is_empty() {
            by_date.remove(&date);
        }
    }
    if by_date.is_empty() {
        index.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classroom::Classroom;
    use crate::course::{Course, Enrollment};
    use chrono::NaiveTime;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn fixture() -> (CourseRoster, Course, Course, Classroom) {
        let cs101 = Course::new("CS101", "Intro", 120);
        let ma101 = Course::new("MA101", "Calculus", 90);
        let ali = Student::new("S1", "Ali");
        let veli = Student::new("S2", "Veli");
        let roster = CourseRoster::from_enrollments(&[
            Enrollment::new(ali.clone(), cs101.clone()),
            Enrollment::new(veli.clone(), cs101.clone()),
            Enrollment::new(ali, ma101.clone()),
        ]);
        (roster, cs101, ma101, Classroom::new("A101", "Hall", 50))
    }

    #[test]
    fn tracks_student_exam_counts() {
        let (roster, cs101, _, room) = fixture();
        let mut state = ScheduleState::new(&roster);
        let date = d(2024, 1, 1);
        let slot = ExamSlot::new(date, t(10, 0), t(12, 0)).unwrap();

        assert_eq!(state.exams_count_for_student_date("S1", date), 0);
        state.add(Exam::new(cs101, room, slot));
        assert_eq!(state.exams_count_for_student_date("S1", date), 1);
        assert_eq!(state.exams_count_for_student_date("S2", date), 1);
        assert_eq!(state.exams_count_for_student_date("S1", d(2024, 1, 2)), 0);

        state.remove_last();
        assert_eq!(state.exams_count_for_student_date("S1", date), 0);
        assert!(state.indices_are_empty());
    }

    #[test]
    fn student_exams_keep_insertion_order() {
        let (roster, cs101, ma101, room) = fixture();
        let mut state = ScheduleState::new(&roster);
        let date = d(2024, 1, 1);
        state.add(Exam::new(
            ma101,
            room.clone(),
            ExamSlot::new(date, t(14, 0), t(15, 30)).unwrap(),
        ));
        state.add(Exam::new(
            cs101,
            room,
            ExamSlot::new(date, t(9, 0), t(11, 0)).unwrap(),
        ));

        let codes: Vec<&str> = state
            .exams_for_student_date("S1", date)
            .map(|exam| exam.course.code.as_str())
            .collect();
        assert_eq!(codes, vec!["MA101", "CS101"]);
        assert_eq!(state.exams_for_student_date("S2", date).count(), 1);
        assert_eq!(state.exam_count_on(date), 2);
    }

    #[test]
    fn tracks_classroom_availability() {
        let (roster, cs101, _, room) = fixture();
        let mut state = ScheduleState::new(&roster);
        let date = d(2024, 1, 1);
        state.add(Exam::new(
            cs101,
            room.clone(),
            ExamSlot::new(date, t(10, 0), t(12, 0)).unwrap(),
        ));

        let overlapping = ExamSlot::new(date, t(11, 0), t(13, 0)).unwrap();
        let adjacent = ExamSlot::new(date, t(12, 0), t(14, 0)).unwrap();
        let next_day = ExamSlot::new(d(2024, 1, 2), t(10, 0), t(12, 0)).unwrap();
        assert!(!state.is_classroom_available(&room.id, &overlapping));
        assert!(state.is_classroom_available(&room.id, &adjacent));
        assert!(state.is_classroom_available(&room.id, &next_day));
        assert!(state.is_classroom_available("B202", &overlapping));
    }

    #[test]
    fn unknown_lookups_are_empty() {
        let (roster, ..) = fixture();
        let state = ScheduleState::new(&roster);
        let date = d(2024, 1, 1);
        assert_eq!(state.exams_for_student_date("UNKNOWN", date).count(), 0);
        assert_eq!(state.exams_count_for_student_date("UNKNOWN", date), 0);
        assert!(state.students_for_course("UNKNOWN").is_empty());
    }

    #[test]
    fn remove_last_on_empty_state_is_a_no_op() {
        let (roster, ..) = fixture();
        let mut state = ScheduleState::new(&roster);
        assert!(state.remove_last().is_none());
        assert!(state.is_empty());
        assert!(state.indices_are_empty());
    }
}
