use crate::course::{Course, CourseRoster};

/// Smallest day count worth probing.
///
/// Two independent floors, whichever is larger: total exam minutes spread
/// over every classroom's daily window, and the busiest student's course
/// load at `max_exams_per_day` per day. Never below one; `margin` is added
/// on top.
pub fn lower_bound(
    courses: &[Course],
    classroom_count: usize,
    window_minutes: i64,
    roster: &CourseRoster,
    max_exams_per_day: usize,
    margin: usize,
) -> usize {
    let total_minutes: i64 = courses
        .iter()
        .map(|course| course.duration_minutes.max(0))
        .sum();
    let daily_capacity = classroom_count as i64 * window_minutes;
    let by_room_time = if daily_capacity > 0 {
        div_ceil_i64(total_minutes, daily_capacity) as usize
    } else {
        1
    };

    let by_student_load = if max_exams_per_day > 0 {
        roster.max_courses_per_student().div_ceil(max_exams_per_day)
    } else {
        1
    };

    by_room_time.max(by_student_load).max(1) + margin
}

fn div_ceil_i64(numerator: i64, denominator: i64) -> i64 {
    (numerator + denominator - 1) / denominator
}
