use crate::{
    entities::{course, course_enrollment},
    error::ServiceError,
    services::{catalog::CatalogService, program_enrollment::ProgramEnrollmentService},
};
use chrono::{DateTime, Utc};
use models::course_run::{CourseRunStatus, course_run_url};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use uuid::Uuid;

/// What a program learner sees of one of their course runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourseRunOverview {
    pub course_run_id: String,
    pub display_name: String,
    pub course_run_url: String,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub course_run_status: CourseRunStatus,
}

pub struct OverviewService;

impl OverviewService {
    /// Course runs of a program the user is enrolled in, whatever the enrollment status
    ///
    /// Fails with `Forbidden` when the user has no enrollment in the program.
    pub async fn get_enrollment_overviews(
        db: &DatabaseConnection,
        user_id: Uuid,
        program_uuid: Uuid,
        root_url: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<CourseRunOverview>, ServiceError> {
        CatalogService::get_program(db, program_uuid).await?;

        let enrollments = ProgramEnrollmentService::fetch_program_enrollments_by_student(
            db,
            user_id,
            &[program_uuid],
            &[],
        )
        .await?;
        if enrollments.is_empty() {
            return Err(ServiceError::Forbidden(format!(
                "User is not enrolled in program {program_uuid}"
            )));
        }

        let program_course_keys = CatalogService::program_course_keys(db, program_uuid).await?;
        let enrolled_keys: Vec<String> = course_enrollment::Entity::find()
            .filter(course_enrollment::Column::UserId.eq(user_id))
            .filter(course_enrollment::Column::IsActive.eq(true))
            .filter(course_enrollment::Column::CourseKey.is_in(program_course_keys))
            .all(db)
            .await?
            .into_iter()
            .map(|enrollment| enrollment.course_key)
            .collect();

        let courses = course::Entity::find()
            .filter(course::Column::Id.is_in(enrolled_keys))
            .order_by_asc(course::Column::Id)
            .all(db)
            .await?;

        Ok(courses
            .into_iter()
            .map(|course| {
                let start_date = course.start_date.map(|date| date.and_utc());
                let end_date = course.end_date.map(|date| date.and_utc());
                CourseRunOverview {
                    course_run_url: course_run_url(root_url, &course.id),
                    course_run_status: CourseRunStatus::from_dates(start_date, end_date, now),
                    course_run_id: course.id,
                    display_name: course.display_name,
                    start_date,
                    end_date,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_util::{
        insert_course, insert_course_enrollment, insert_program, insert_program_enrollment,
        insert_user, setup_db,
    };
    use chrono::Duration;
    use models::enrollment_status::{CourseMode, ProgramEnrollmentStatus};
    use sea_orm::{ActiveModelTrait, ActiveValue::Set, IntoActiveModel};

    const CURRENT: &str = "course-v1:TestX+Current+1";
    const FINISHED: &str = "course-v1:TestX+Finished+1";
    const DROPPED: &str = "course-v1:TestX+Dropped+1";

    #[tokio::test]
    async fn test_enrollment_overviews() {
        let db = setup_db().await;
        let now = Utc::now();
        for key in [CURRENT, FINISHED, DROPPED] {
            insert_course(&db, key).await;
        }
        let mut finished = course::Entity::find_by_id(FINISHED.to_string())
            .one(&db)
            .await
            .unwrap()
            .unwrap()
            .into_active_model();
        finished.start_date = Set(Some((now - Duration::days(30)).naive_utc()));
        finished.end_date = Set(Some((now - Duration::days(1)).naive_utc()));
        finished.update(&db).await.unwrap();

        let fixture = insert_program(&db, "TestX", &[CURRENT, FINISHED, DROPPED]).await;
        let user = insert_user(&db, "learner", false).await;
        insert_program_enrollment(&db, &fixture, Some("abc"), Some(user.id), ProgramEnrollmentStatus::Enrolled)
            .await;
        insert_course_enrollment(&db, user.id, CURRENT, CourseMode::Masters, true).await;
        insert_course_enrollment(&db, user.id, FINISHED, CourseMode::Masters, true).await;
        insert_course_enrollment(&db, user.id, DROPPED, CourseMode::Masters, false).await;

        let overviews = OverviewService::get_enrollment_overviews(
            &db,
            user.id,
            fixture.program.uuid,
            "http://localhost:18000",
            now,
        )
        .await
        .unwrap();

        assert_eq!(overviews.len(), 2);
        assert_eq!(overviews[0].course_run_id, CURRENT);
        assert_eq!(overviews[0].course_run_status, CourseRunStatus::InProgress);
        assert_eq!(
            overviews[0].course_run_url,
            format!("http://localhost:18000/courses/{CURRENT}/course/")
        );
        assert_eq!(overviews[1].course_run_id, FINISHED);
        assert_eq!(overviews[1].course_run_status, CourseRunStatus::Completed);
    }

    #[tokio::test]
    async fn test_inactive_program_enrollment_still_grants_access() {
        let db = setup_db().await;
        insert_course(&db, CURRENT).await;
        let fixture = insert_program(&db, "TestX", &[CURRENT]).await;
        let user = insert_user(&db, "learner", false).await;
        insert_program_enrollment(&db, &fixture, Some("abc"), Some(user.id), ProgramEnrollmentStatus::Suspended)
            .await;
        insert_course_enrollment(&db, user.id, CURRENT, CourseMode::Masters, true).await;

        let overviews = OverviewService::get_enrollment_overviews(
            &db,
            user.id,
            fixture.program.uuid,
            "http://localhost:18000",
            Utc::now(),
        )
        .await
        .unwrap();
        assert_eq!(overviews.len(), 1);
        assert_eq!(overviews[0].course_run_id, CURRENT);
    }

    #[tokio::test]
    async fn test_requires_program_enrollment() {
        let db = setup_db().await;
        let fixture = insert_program(&db, "TestX", &[]).await;
        let user = insert_user(&db, "learner", false).await;

        let result = OverviewService::get_enrollment_overviews(
            &db,
            user.id,
            fixture.program.uuid,
            "http://localhost:18000",
            Utc::now(),
        )
        .await;
        assert!(matches!(result, Err(ServiceError::Forbidden(_))));
    }
}
