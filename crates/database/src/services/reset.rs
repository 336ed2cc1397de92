use crate::{
    entities::{
        course_enrollment, program, program_course_enrollment, program_enrollment, user,
        user_social_auth,
    },
    error::ServiceError,
    services::catalog::CatalogService,
};
use log::{info, warn};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, TransactionTrait,
};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResetCounts {
    pub users: u64,
    pub program_enrollments: u64,
    pub program_course_enrollments: u64,
    pub course_enrollments: u64,
}

pub struct ResetService;

impl ResetService {
    /// Deletes every enrollment of the given programs in one transaction
    ///
    /// Course enrollments created for program learners are deleted along
    /// with the program course enrollments pointing at them.
    pub async fn reset_enrollment_data(
        db: &DatabaseConnection,
        program_uuids: &[Uuid],
    ) -> Result<ResetCounts, ServiceError> {
        let txn = db.begin().await?;
        let counts = Self::delete_program_enrollments(&txn, program_uuids).await?;
        txn.commit().await?;

        info!(
            "Reset {} programs: removed {} program enrollments, {} program course enrollments, {} course enrollments",
            program_uuids.len(),
            counts.program_enrollments,
            counts.program_course_enrollments,
            counts.course_enrollments
        );
        Ok(counts)
    }

    async fn delete_program_enrollments<C: ConnectionTrait>(
        db: &C,
        program_uuids: &[Uuid],
    ) -> Result<ResetCounts, ServiceError> {
        let enrollment_ids: Vec<Uuid> = program_enrollment::Entity::find()
            .filter(program_enrollment::Column::ProgramUuid.is_in(program_uuids.to_vec()))
            .all(db)
            .await?
            .into_iter()
            .map(|enrollment| enrollment.id)
            .collect();

        let course_enrollment_ids: Vec<Uuid> = program_course_enrollment::Entity::find()
            .filter(program_course_enrollment::Column::ProgramEnrollmentId.is_in(enrollment_ids.clone()))
            .all(db)
            .await?
            .into_iter()
            .filter_map(|enrollment| enrollment.course_enrollment_id)
            .collect();

        let program_course_enrollments = program_course_enrollment::Entity::delete_many()
            .filter(program_course_enrollment::Column::ProgramEnrollmentId.is_in(enrollment_ids.clone()))
            .exec(db)
            .await?;
        let course_enrollments = course_enrollment::Entity::delete_many()
            .filter(course_enrollment::Column::Id.is_in(course_enrollment_ids))
            .exec(db)
            .await?;
        let program_enrollments = program_enrollment::Entity::delete_many()
            .filter(program_enrollment::Column::Id.is_in(enrollment_ids))
            .exec(db)
            .await?;

        Ok(ResetCounts {
            users: 0,
            program_enrollments: program_enrollments.rows_affected,
            program_course_enrollments: program_course_enrollments.rows_affected,
            course_enrollments: course_enrollments.rows_affected,
        })
    }

    /// Deletes the users who signed in through the given identity providers
    async fn remove_social_auth_users<C: ConnectionTrait>(
        db: &C,
        provider_slugs: &[String],
    ) -> Result<u64, ServiceError> {
        let user_ids: Vec<Uuid> = user_social_auth::Entity::find()
            .filter(user_social_auth::Column::Provider.is_in(provider_slugs.to_vec()))
            .all(db)
            .await?
            .into_iter()
            .map(|auth| auth.user_id)
            .collect();
        if user_ids.is_empty() {
            return Ok(0);
        }

        let enrollment_ids: Vec<Uuid> = program_enrollment::Entity::find()
            .filter(program_enrollment::Column::UserId.is_in(user_ids.clone()))
            .all(db)
            .await?
            .into_iter()
            .map(|enrollment| enrollment.id)
            .collect();

        program_course_enrollment::Entity::delete_many()
            .filter(program_course_enrollment::Column::ProgramEnrollmentId.is_in(enrollment_ids.clone()))
            .exec(db)
            .await?;
        program_enrollment::Entity::delete_many()
            .filter(program_enrollment::Column::Id.is_in(enrollment_ids))
            .exec(db)
            .await?;
        course_enrollment::Entity::delete_many()
            .filter(course_enrollment::Column::UserId.is_in(user_ids.clone()))
            .exec(db)
            .await?;
        user_social_auth::Entity::delete_many()
            .filter(user_social_auth::Column::UserId.is_in(user_ids.clone()))
            .exec(db)
            .await?;
        let users = user::Entity::delete_many()
            .filter(user::Column::Id.is_in(user_ids))
            .exec(db)
            .await?;

        Ok(users.rows_affected)
    }

    /// Wipes an organization's learner data for integration testing
    ///
    /// Removes the users of the organization's identity providers, then
    /// every enrollment in its programs.
    pub async fn reset_organization(
        db: &DatabaseConnection,
        short_name: &str,
    ) -> Result<ResetCounts, ServiceError> {
        let organization = CatalogService::get_organization(db, short_name).await?;
        let provider_slugs = CatalogService::provider_slugs(db, organization.id).await?;
        if provider_slugs.is_empty() {
            warn!("Organization {short_name} has no enabled identity provider");
        }
        let program_uuids: Vec<Uuid> = program::Entity::find()
            .filter(program::Column::OrganizationId.eq(organization.id))
            .all(db)
            .await?
            .into_iter()
            .map(|program| program.uuid)
            .collect();

        let txn = db.begin().await?;
        let users = Self::remove_social_auth_users(&txn, &provider_slugs).await?;
        let counts = Self::delete_program_enrollments(&txn, &program_uuids).await?;
        txn.commit().await?;

        info!(
            "Reset organization {short_name}: removed {users} users and {} program enrollments",
            counts.program_enrollments
        );
        Ok(ResetCounts { users, ..counts })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_util::{
        insert_course, insert_course_enrollment, insert_program, insert_program_course_enrollment,
        insert_program_enrollment, insert_social_auth, insert_user, setup_db,
    };
    use models::enrollment_status::{
        CourseMode, ProgramCourseEnrollmentStatus, ProgramEnrollmentStatus,
    };
    use sea_orm::PaginatorTrait;

    const COURSE: &str = "course-v1:TestX+Reset+1";

    #[tokio::test]
    async fn test_reset_enrollment_data() {
        let db = setup_db().await;
        insert_course(&db, COURSE).await;
        let fixture = insert_program(&db, "TestX", &[COURSE]).await;
        let kept = insert_program(&db, "OtherX", &[]).await;
        let user = insert_user(&db, "learner", false).await;

        let enrollment = insert_program_enrollment(&db, &fixture, Some("abc"), Some(user.id), ProgramEnrollmentStatus::Enrolled)
            .await;
        let course_enrollment = insert_course_enrollment(&db, user.id, COURSE, CourseMode::Masters, true).await;
        insert_program_course_enrollment(
            &db,
            &enrollment,
            COURSE,
            Some(course_enrollment.id),
            ProgramCourseEnrollmentStatus::Active,
        )
        .await;
        insert_program_enrollment(&db, &kept, Some("abc"), None, ProgramEnrollmentStatus::Enrolled).await;

        let counts = ResetService::reset_enrollment_data(&db, &[fixture.program.uuid])
            .await
            .unwrap();
        assert_eq!(
            counts,
            ResetCounts {
                users: 0,
                program_enrollments: 1,
                program_course_enrollments: 1,
                course_enrollments: 1,
            }
        );
        assert_eq!(program_enrollment::Entity::find().count(&db).await.unwrap(), 1);
        assert_eq!(user::Entity::find().count(&db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_reset_organization() {
        let db = setup_db().await;
        let fixture = insert_program(&db, "TestX", &[]).await;
        let learner = insert_user(&db, "learner", false).await;
        insert_user(&db, "bystander", false).await;
        insert_social_auth(&db, learner.id, &fixture.provider_slug, "abc").await;
        insert_program_enrollment(&db, &fixture, Some("abc"), Some(learner.id), ProgramEnrollmentStatus::Enrolled)
            .await;
        insert_program_enrollment(&db, &fixture, Some("def"), None, ProgramEnrollmentStatus::Pending)
            .await;

        let counts = ResetService::reset_organization(&db, "TestX").await.unwrap();
        assert_eq!(counts.users, 1);
        assert_eq!(counts.program_enrollments, 1);

        let usernames: Vec<_> = user::Entity::find()
            .all(&db)
            .await
            .unwrap()
            .into_iter()
            .map(|user| user.username)
            .collect();
        assert_eq!(usernames, vec!["bystander".to_string()]);
        assert_eq!(program_enrollment::Entity::find().count(&db).await.unwrap(), 0);

        assert!(matches!(
            ResetService::reset_organization(&db, "NoSuchX").await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
