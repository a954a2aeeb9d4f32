//! # Completion Tracker
//!
//! Integer completion percentages for courses and skills.

use crate::primitives::COMPLETION_PERCENT;
use serde::{Deserialize, Serialize};

/// Completion state of one course in a learning path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseProgress {
    pub course_id: i64,
    pub percent: u8,
}

impl CourseProgress {
    /// A course is completed once every video has been watched.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        self.percent >= COMPLETION_PERCENT
    }
}

/// Percentage of a course's videos watched, floored and clamped to `0..=100`.
///
/// `distinct_watched` counts video indices, not watch events. A course with
/// no videos is at 0%.
#[must_use]
pub fn course_completion_percent(distinct_watched: u32, total_videos: u32) -> u8 {
    if total_videos == 0 {
        return 0;
    }
    let percent = u64::from(distinct_watched).saturating_mul(100) / u64::from(total_videos);
    percent.min(u64::from(COMPLETION_PERCENT)) as u8
}

/// Integer mean of course percentages; 0 when there are none.
#[must_use]
pub fn skill_completion_percent(course_percents: &[u8]) -> u8 {
    if course_percents.is_empty() {
        return 0;
    }
    let sum: u64 = course_percents.iter().map(|&p| u64::from(p)).sum();
    let mean = sum / course_percents.len() as u64;
    mean.min(u64::from(COMPLETION_PERCENT)) as u8
}

/// First course, in roadmap order, that is not completed yet.
#[must_use]
pub fn active_course(roadmap: &[CourseProgress]) -> Option<i64> {
    roadmap
        .iter()
        .find(|course| !course.is_completed())
        .map(|course| course.course_id)
}

/// Whether every course of a path is completed. An empty path is complete.
#[must_use]
pub fn path_completed(roadmap: &[CourseProgress]) -> bool {
    roadmap.iter().all(CourseProgress::is_completed)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn course_percent_floors_and_clamps() {
        assert_eq!(course_completion_percent(0, 3), 0);
        assert_eq!(course_completion_percent(1, 3), 33);
        assert_eq!(course_completion_percent(2, 3), 66);
        assert_eq!(course_completion_percent(3, 3), 100);
        assert_eq!(course_completion_percent(5, 3), 100);
        assert_eq!(course_completion_percent(4, 0), 0);
    }

    #[test]
    fn skill_percent_is_integer_mean() {
        assert_eq!(skill_completion_percent(&[]), 0);
        assert_eq!(skill_completion_percent(&[100, 50]), 75);
        assert_eq!(skill_completion_percent(&[100, 33, 0]), 44);
    }

    #[test]
    fn active_course_is_first_incomplete() {
        let roadmap = [
            CourseProgress { course_id: 9, percent: 100 },
            CourseProgress { course_id: 2, percent: 40 },
            CourseProgress { course_id: 5, percent: 0 },
        ];
        assert_eq!(active_course(&roadmap), Some(2));
        assert!(!path_completed(&roadmap));
    }

    #[test]
    fn finished_path_has_no_active_course() {
        let roadmap = [
            CourseProgress { course_id: 1, percent: 100 },
            CourseProgress { course_id: 2, percent: 100 },
        ];
        assert_eq!(active_course(&roadmap), None);
        assert!(path_completed(&roadmap));
    }
}
