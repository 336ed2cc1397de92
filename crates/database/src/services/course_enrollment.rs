use crate::{
    entities::{course, course_enrollment},
    error::ServiceError,
};
use chrono::Utc;
use log::{info, warn};
use models::enrollment_status::CourseMode;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DbErr, EntityTrait,
    IntoActiveModel, QueryFilter, sea_query::Expr,
};
use uuid::Uuid;

pub struct CourseEnrollmentService;

impl CourseEnrollmentService {
    /// Enrolls a program learner in the masters track of a course run
    ///
    /// An existing enrollment is reused: audit and honor are promoted to
    /// masters, any other mode is left alone.
    pub async fn enroll_in_masters_track<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        course_key: &str,
        is_active: bool,
    ) -> Result<course_enrollment::Model, ServiceError> {
        if course::Entity::find_by_id(course_key.to_string())
            .one(db)
            .await?
            .is_none()
        {
            return Err(ServiceError::NotFound(format!("Course {course_key} not found")));
        }

        let existing = course_enrollment::Entity::find()
            .filter(course_enrollment::Column::UserId.eq(user_id))
            .filter(course_enrollment::Column::CourseKey.eq(course_key))
            .one(db)
            .await?;

        let Some(enrollment) = existing else {
            info!("Enrolling user {user_id} in {course_key} as masters");
            let enrollment = course_enrollment::ActiveModel {
                id: Set(Uuid::new_v4()),
                user_id: Set(user_id),
                course_key: Set(course_key.to_string()),
                mode: Set(CourseMode::Masters),
                is_active: Set(is_active),
                created_at: Set(Utc::now().naive_utc()),
            };
            return Ok(enrollment.insert(db).await?);
        };

        let mode = if enrollment.mode.promotes_to_masters() {
            info!(
                "Promoting user {user_id} in {course_key} from {} to masters",
                enrollment.mode.as_ref()
            );
            CourseMode::Masters
        } else {
            if enrollment.mode != CourseMode::Masters {
                warn!(
                    "User {user_id} is enrolled in {course_key} as {}, not changing to masters",
                    enrollment.mode.as_ref()
                );
            }
            enrollment.mode
        };

        let mut active = enrollment.into_active_model();
        active.mode = Set(mode);
        active.is_active = Set(is_active);
        Ok(active.update(db).await?)
    }

    pub async fn set_active<C: ConnectionTrait>(
        db: &C,
        enrollment_id: Uuid,
        is_active: bool,
    ) -> Result<(), DbErr> {
        course_enrollment::Entity::update_many()
            .col_expr(course_enrollment::Column::IsActive, Expr::value(is_active))
            .filter(course_enrollment::Column::Id.eq(enrollment_id))
            .exec(db)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_util::{insert_course, insert_course_enrollment, insert_user, setup_db};

    const COURSE: &str = "course-v1:TestX+Enroll+1";

    #[tokio::test]
    async fn test_new_enrollment_is_masters() {
        let db = setup_db().await;
        insert_course(&db, COURSE).await;
        let user = insert_user(&db, "learner", false).await;

        let enrollment = CourseEnrollmentService::enroll_in_masters_track(&db, user.id, COURSE, true)
            .await
            .unwrap();

        assert_eq!(enrollment.mode, CourseMode::Masters);
        assert!(enrollment.is_active);
    }

    #[tokio::test]
    async fn test_audit_is_promoted() {
        let db = setup_db().await;
        insert_course(&db, COURSE).await;
        let user = insert_user(&db, "learner", false).await;
        let existing = insert_course_enrollment(&db, user.id, COURSE, CourseMode::Audit, false).await;

        let enrollment = CourseEnrollmentService::enroll_in_masters_track(&db, user.id, COURSE, true)
            .await
            .unwrap();

        assert_eq!(enrollment.id, existing.id);
        assert_eq!(enrollment.mode, CourseMode::Masters);
        assert!(enrollment.is_active);
    }

    #[tokio::test]
    async fn test_verified_is_kept() {
        let db = setup_db().await;
        insert_course(&db, COURSE).await;
        let user = insert_user(&db, "learner", false).await;
        insert_course_enrollment(&db, user.id, COURSE, CourseMode::Verified, true).await;

        let enrollment = CourseEnrollmentService::enroll_in_masters_track(&db, user.id, COURSE, false)
            .await
            .unwrap();

        assert_eq!(enrollment.mode, CourseMode::Verified);
        assert!(!enrollment.is_active);
    }

    #[tokio::test]
    async fn test_missing_course() {
        let db = setup_db().await;
        let user = insert_user(&db, "learner", false).await;

        let result = CourseEnrollmentService::enroll_in_masters_track(&db, user.id, COURSE, true).await;
        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_set_active() {
        let db = setup_db().await;
        insert_course(&db, COURSE).await;
        let user = insert_user(&db, "learner", false).await;
        let enrollment = insert_course_enrollment(&db, user.id, COURSE, CourseMode::Masters, true).await;

        CourseEnrollmentService::set_active(&db, enrollment.id, false)
            .await
            .unwrap();

        let enrollment = course_enrollment::Entity::find_by_id(enrollment.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert!(!enrollment.is_active);
    }
}
