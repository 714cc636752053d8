use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Course {
    pub code: String,
    pub name: String,
    pub duration_minutes: i64,
}

impl Course {
    pub fn new(code: impl Into<String>, name: impl Into<String>, duration_minutes: i64) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            duration_minutes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Student {
    pub id: String,
    pub name: String,
}

impl Student {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A single (student, course) membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    pub student: Student,
    pub course: Course,
}

impl Enrollment {
    pub fn new(student: Student, course: Course) -> Self {
        Self { student, course }
    }
}

/// Enrollment index: course code -> enrolled students, and the inverse
/// student id -> course codes.
///
/// Students keep the order in which they first appear in the enrollment list.
/// A repeated (student, course) pair is counted once.
#[derive(Debug, Clone, Default)]
pub struct CourseRoster {
    course_students: HashMap<String, Vec<Student>>,
    student_courses: HashMap<String, BTreeSet<String>>,
}

impl CourseRoster {
    pub fn from_enrollments(enrollments: &[Enrollment]) -> Self {
        let mut course_students: HashMap<String, Vec<Student>> = HashMap::new();
        let mut student_courses: HashMap<String, BTreeSet<String>> = HashMap::new();
        let mut seen: HashSet<(&str, &str)> = HashSet::with_capacity(enrollments.len());

        for enrollment in enrollments {
            let key = (
                enrollment.student.id.as_str(),
                enrollment.course.code.as_str(),
            );
            if !seen.insert(key) {
                continue;
            }
            course_students
                .entry(enrollment.course.code.clone())
                .or_default()
                .push(enrollment.student.clone());
            student_courses
                .entry(enrollment.student.id.clone())
                .or_default()
                .insert(enrollment.course.code.clone());
        }

        Self {
            course_students,
            student_courses,
        }
    }

    pub fn students_for_course(&self, course_code: &str) -> &[Student] {
        self.course_students
            .get(course_code)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn enrolled_count(&self, course_code: &str) -> usize {
        self.students_for_course(course_code).len()
    }

    pub fn is_enrolled(&self, student_id: &str, course_code: &str) -> bool {
        self.student_courses
            .get(student_id)
            .is_some_and(|courses| courses.contains(course_code))
    }

    pub fn courses_for_student(&self, student_id: &str) -> impl Iterator<Item = &str> {
        self.student_courses
            .get(student_id)
            .into_iter()
            .flat_map(|courses| courses.iter().map(String::as_str))
    }

    /// Largest number of distinct courses any single student sits.
    pub fn max_courses_per_student(&self) -> usize {
        self.student_courses
            .values()
            .map(BTreeSet::len)
            .max()
            .unwrap_or(0)
    }

    pub fn student_count(&self) -> usize {
        self.student_courses.len()
    }
}
