pub mod grades;
pub mod health;
pub mod overview;
pub mod program_course_enrollments;
pub mod program_enrollments;
pub mod programs;
pub mod reset;
pub mod social_auth;
pub mod tabs;

use axum::http::StatusCode;
use database::services::program_enrollment::WriteResults;
use models::enrollment_status::{BatchOutcome, WriteStatus};

/// Status code summarizing the per-learner results of a bulk write
pub(crate) fn write_status_code<S>(results: &WriteResults<S>) -> StatusCode {
    match BatchOutcome::from_flags(results.values().map(WriteStatus::is_ok)) {
        BatchOutcome::AllOk => StatusCode::OK,
        BatchOutcome::Partial => StatusCode::MULTI_STATUS,
        BatchOutcome::AllFailed | BatchOutcome::Empty => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use models::enrollment_status::{ProgramEnrollmentStatus, WriteError};

    #[test]
    fn test_write_status_code() {
        let mut results: WriteResults<ProgramEnrollmentStatus> = WriteResults::new();
        assert_eq!(write_status_code(&results), StatusCode::UNPROCESSABLE_ENTITY);

        results.insert("a".to_string(), WriteStatus::Written(ProgramEnrollmentStatus::Enrolled));
        assert_eq!(write_status_code(&results), StatusCode::OK);

        results.insert("b".to_string(), WriteError::Duplicated.into());
        assert_eq!(write_status_code(&results), StatusCode::MULTI_STATUS);

        results.remove("a");
        assert_eq!(write_status_code(&results), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
