use crate::classroom::Classroom;
use crate::course::{Course, Enrollment};
use crate::error::SchedulerError;
use crate::scheduler::{Horizon, ScheduleRequest};
use std::collections::HashSet;

pub fn validate_course(course: &Course) -> Result<(), SchedulerError> {
    if course.code.trim().is_empty() {
        return Err(SchedulerError::invalid(format!(
            "course '{}' has an empty code",
            course.name
        )));
    }
    if course.duration_minutes <= 0 {
        return Err(SchedulerError::invalid(format!(
            "course {} has non-positive duration {}",
            course.code, course.duration_minutes
        )));
    }
    Ok(())
}

pub fn validate_classroom(classroom: &Classroom) -> Result<(), SchedulerError> {
    if classroom.id.trim().is_empty() {
        return Err(SchedulerError::invalid(format!(
            "classroom '{}' has an empty id",
            classroom.name
        )));
    }
    if classroom.capacity == 0 {
        return Err(SchedulerError::invalid(format!(
            "classroom {} has zero capacity",
            classroom.id
        )));
    }
    Ok(())
}

pub fn validate_course_collection(courses: &[Course]) -> Result<(), SchedulerError> {
    if courses.is_empty() {
        return Err(SchedulerError::invalid("no courses to schedule"));
    }
    let mut seen = HashSet::with_capacity(courses.len());
    for course in courses {
        if !seen.insert(course.code.as_str()) {
            return Err(SchedulerError::invalid(format!(
                "duplicate course code {}",
                course.code
            )));
        }
        validate_course(course)?;
    }
    Ok(())
}

pub fn validate_classroom_collection(classrooms: &[Classroom]) -> Result<(), SchedulerError> {
    if classrooms.is_empty() {
        return Err(SchedulerError::invalid("no classrooms available"));
    }
    let mut seen = HashSet::with_capacity(classrooms.len());
    for classroom in classrooms {
        if !seen.insert(classroom.id.as_str()) {
            return Err(SchedulerError::invalid(format!(
                "duplicate classroom id {}",
                classroom.id
            )));
        }
        validate_classroom(classroom)?;
    }
    Ok(())
}

pub fn validate_enrollments(
    enrollments: &[Enrollment],
    courses: &[Course],
) -> Result<(), SchedulerError> {
    if enrollments.is_empty() {
        return Err(SchedulerError::invalid("no enrollments given"));
    }
    let known: HashSet<&str> = courses.iter().map(|course| course.code.as_str()).collect();
    for enrollment in enrollments {
        if enrollment.student.id.trim().is_empty() {
            return Err(SchedulerError::invalid(format!(
                "enrollment in {} has an empty student id",
                enrollment.course.code
            )));
        }
        if !known.contains(enrollment.course.code.as_str()) {
            return Err(SchedulerError::invalid(format!(
                "student {} is enrolled in unknown course {}",
                enrollment.student.id, enrollment.course.code
            )));
        }
    }
    Ok(())
}

/// Checks everything that can be rejected before the search starts.
pub fn validate_request(request: &ScheduleRequest) -> Result<(), SchedulerError> {
    validate_course_collection(&request.courses)?;
    validate_classroom_collection(&request.classrooms)?;
    validate_enrollments(&request.enrollments, &request.courses)?;

    match request.horizon {
        Horizon::EndDate(end) if end < request.start_date => {
            return Err(SchedulerError::invalid(format!(
                "end date {} is before start date {}",
                end, request.start_date
            )));
        }
        Horizon::Days(0) => {
            return Err(SchedulerError::invalid("day count must be at least 1"));
        }
        _ => {}
    }

    if request.max_exams_per_day == Some(0) {
        return Err(SchedulerError::invalid("max_exams_per_day must be at least 1"));
    }
    if let Some(gap) = request.min_gap_minutes {
        if gap < 0 {
            return Err(SchedulerError::invalid(format!(
                "min_gap_minutes must not be negative (got {})",
                gap
            )));
        }
    }
    Ok(())
}
