use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::AsRefStr;

/// Where a course run is in its lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CourseRunStatus {
    Upcoming,
    InProgress,
    Completed,
}

impl CourseRunStatus {
    /// Derives the status from the run's dates
    ///
    /// A run without a start date counts as started; one without an end
    /// date never completes.
    pub fn from_dates(
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Self {
        if end.is_some_and(|end| end <= now) {
            Self::Completed
        } else if start.is_none_or(|start| start <= now) {
            Self::InProgress
        } else {
            Self::Upcoming
        }
    }
}

/// Builds the learner-facing URL of a course run
pub fn course_run_url(root_url: &str, course_key: &str) -> String {
    format!("{}/courses/{course_key}/course/", root_url.trim_end_matches('/'))
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_course_run_status() {
        let now = Utc::now();
        let day = Duration::days(1);

        assert_eq!(
            CourseRunStatus::from_dates(Some(now + day), None, now),
            CourseRunStatus::Upcoming
        );
        assert_eq!(
            CourseRunStatus::from_dates(Some(now - day), Some(now + day), now),
            CourseRunStatus::InProgress
        );
        assert_eq!(
            CourseRunStatus::from_dates(None, None, now),
            CourseRunStatus::InProgress
        );
        assert_eq!(
            CourseRunStatus::from_dates(Some(now - day * 2), Some(now - day), now),
            CourseRunStatus::Completed
        );
    }

    #[test]
    fn test_course_run_url() {
        assert_eq!(
            course_run_url("https://courses.example.com/", "course-v1:edX+DemoX+Demo"),
            "https://courses.example.com/courses/course-v1:edX+DemoX+Demo/course/"
        );
    }
}
