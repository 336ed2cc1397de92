use crate::{
    entities::{program, program_course_enrollment, program_enrollment, saml_provider, user},
    error::ServiceError,
    services::course_enrollment::CourseEnrollmentService,
};
use chrono::Utc;
use log::{error, info, warn};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, QueryFilter, TransactionTrait,
};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

pub struct LinkingService;

impl LinkingService {
    /// Links waiting program enrollments to existing platform users
    ///
    /// `links` maps external user keys to usernames. Each learner is linked
    /// in its own transaction, so one failure never undoes another learner.
    /// Returns an error message for every key that wasn't linked.
    pub async fn link_program_enrollments(
        db: &DatabaseConnection,
        program_uuid: Uuid,
        links: &BTreeMap<String, String>,
    ) -> Result<BTreeMap<String, String>, ServiceError> {
        let usernames: Vec<&str> = links.values().map(String::as_str).collect();
        let users: HashMap<String, user::Model> = user::Entity::find()
            .filter(user::Column::Username.is_in(usernames))
            .all(db)
            .await?
            .into_iter()
            .map(|user| (user.username.clone(), user))
            .collect();

        let keys: Vec<&str> = links.keys().map(String::as_str).collect();
        let enrollments: HashMap<String, program_enrollment::Model> =
            program_enrollment::Entity::find()
                .filter(program_enrollment::Column::ProgramUuid.eq(program_uuid))
                .filter(program_enrollment::Column::ExternalUserKey.is_in(keys))
                .all(db)
                .await?
                .into_iter()
                .filter_map(|enrollment| {
                    enrollment
                        .external_user_key
                        .clone()
                        .map(|key| (key, enrollment))
                })
                .collect();

        let user_ids: Vec<Uuid> = users.values().map(|user| user.id).collect();
        let mut enrolled_users: HashMap<Uuid, Uuid> = program_enrollment::Entity::find()
            .filter(program_enrollment::Column::ProgramUuid.eq(program_uuid))
            .filter(program_enrollment::Column::UserId.is_in(user_ids))
            .all(db)
            .await?
            .into_iter()
            .filter_map(|enrollment| enrollment.user_id.map(|user_id| (user_id, enrollment.id)))
            .collect();

        let mut errors = BTreeMap::new();
        for (key, username) in links {
            let Some(user) = users.get(username) else {
                let message = format!("No user found with username {username}");
                warn!("{message}");
                errors.insert(key.clone(), message);
                continue;
            };

            let Some(enrollment) = enrollments.get(key) else {
                let message =
                    format!("No program enrollment found for program {program_uuid} and key {key}");
                warn!("{message}");
                errors.insert(key.clone(), message);
                continue;
            };

            match enrollment.user_id {
                Some(user_id) if user_id == user.id => {
                    info!("Program enrollment {key} is already linked to {username}");
                    continue;
                }
                Some(_) => {
                    let message = format!(
                        "Program enrollment with external_student_key {key} is already linked to a different account"
                    );
                    warn!("{message}");
                    errors.insert(key.clone(), message);
                    continue;
                }
                None => {}
            }

            if enrolled_users
                .get(&user.id)
                .is_some_and(|enrollment_id| *enrollment_id != enrollment.id)
            {
                let message =
                    format!("User {username} already has a program enrollment for program {program_uuid}");
                warn!("{message}");
                errors.insert(key.clone(), message);
                continue;
            }

            match Self::link_learner(db, enrollment.clone(), user.id).await {
                Ok(()) => {
                    info!("Linked program enrollment {key} to {username}");
                    enrolled_users.insert(user.id, enrollment.id);
                }
                Err(e) => {
                    let message = format!("Unable to link {key}: {e}");
                    error!("{message}");
                    errors.insert(key.clone(), message);
                }
            }
        }

        Ok(errors)
    }

    /// Links the waiting enrollments matching a freshly created social auth
    ///
    /// `uid` has the form `<provider slug>:<external user key>`. Only programs
    /// of the provider's organization are considered. Returns the number of
    /// enrollments linked.
    pub async fn link_waiting_enrollments_for_social_auth(
        db: &DatabaseConnection,
        user_id: Uuid,
        provider_slug: &str,
        uid: &str,
    ) -> Result<usize, ServiceError> {
        let Some(provider) = saml_provider::Entity::find()
            .filter(saml_provider::Column::Slug.eq(provider_slug))
            .filter(saml_provider::Column::Enabled.eq(true))
            .one(db)
            .await?
        else {
            info!("Ignoring social auth of user {user_id}: {provider_slug} is not an enabled provider");
            return Ok(0);
        };

        let external_user_key = uid
            .strip_prefix(provider_slug)
            .and_then(|rest| rest.strip_prefix(':'))
            .unwrap_or(uid);

        let program_uuids: Vec<Uuid> = program::Entity::find()
            .filter(program::Column::OrganizationId.eq(provider.organization_id))
            .all(db)
            .await?
            .into_iter()
            .map(|program| program.uuid)
            .collect();

        let waiting = program_enrollment::Entity::find()
            .filter(program_enrollment::Column::ProgramUuid.is_in(program_uuids))
            .filter(program_enrollment::Column::ExternalUserKey.eq(external_user_key))
            .filter(program_enrollment::Column::UserId.is_null())
            .all(db)
            .await?;

        let mut linked = 0;
        for enrollment in waiting {
            let program_uuid = enrollment.program_uuid;
            match Self::link_learner(db, enrollment, user_id).await {
                Ok(()) => {
                    info!("Linked {external_user_key} in program {program_uuid} to user {user_id}");
                    linked += 1;
                }
                Err(e) => {
                    error!("Unable to link {external_user_key} in program {program_uuid}: {e}");
                }
            }
        }

        Ok(linked)
    }

    /// Attaches a user to a program enrollment and enrolls them in its courses
    async fn link_learner(
        db: &DatabaseConnection,
        enrollment: program_enrollment::Model,
        user_id: Uuid,
    ) -> Result<(), ServiceError> {
        let txn = db.begin().await?;

        let enrollment_id = enrollment.id;
        let mut active = enrollment.into_active_model();
        active.user_id = Set(Some(user_id));
        active.updated_at = Set(Utc::now().naive_utc());
        active.update(&txn).await?;

        let course_enrollments = program_course_enrollment::Entity::find()
            .filter(program_course_enrollment::Column::ProgramEnrollmentId.eq(enrollment_id))
            .all(&txn)
            .await?;

        for program_course_enrollment in course_enrollments {
            let course_enrollment = CourseEnrollmentService::enroll_in_masters_track(
                &txn,
                user_id,
                &program_course_enrollment.course_key,
                program_course_enrollment.status.is_active(),
            )
            .await?;

            let mut active = program_course_enrollment.into_active_model();
            active.course_enrollment_id = Set(Some(course_enrollment.id));
            active.updated_at = Set(Utc::now().naive_utc());
            active.update(&txn).await?;
        }

        txn.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        entities::course_enrollment,
        test_util::{
            insert_course, insert_course_enrollment, insert_program,
            insert_program_course_enrollment, insert_program_enrollment, insert_user, setup_db,
        },
    };
    use models::enrollment_status::{
        CourseMode, ProgramCourseEnrollmentStatus, ProgramEnrollmentStatus,
    };

    const COURSE: &str = "course-v1:TestX+Link+1";

    fn links(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(key, username)| (key.to_string(), username.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_link_enrolls_in_courses() {
        let db = setup_db().await;
        insert_course(&db, COURSE).await;
        let fixture = insert_program(&db, "TestX", &[COURSE]).await;
        let user = insert_user(&db, "learner", false).await;
        insert_course_enrollment(&db, user.id, COURSE, CourseMode::Audit, false).await;
        let enrollment = insert_program_enrollment(&db, &fixture, Some("abc"), None, ProgramEnrollmentStatus::Enrolled)
            .await;
        let course_enrollment = insert_program_course_enrollment(
            &db,
            &enrollment,
            COURSE,
            None,
            ProgramCourseEnrollmentStatus::Active,
        )
        .await;

        let errors = LinkingService::link_program_enrollments(
            &db,
            fixture.program.uuid,
            &links(&[("abc", "learner")]),
        )
        .await
        .unwrap();
        assert!(errors.is_empty());

        let enrollment = program_enrollment::Entity::find_by_id(enrollment.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(enrollment.user_id, Some(user.id));

        let linked = program_course_enrollment::Entity::find_by_id(course_enrollment.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        let enrollments = course_enrollment::Entity::find().all(&db).await.unwrap();
        assert_eq!(enrollments.len(), 1);
        assert_eq!(linked.course_enrollment_id, Some(enrollments[0].id));
        assert_eq!(enrollments[0].mode, CourseMode::Masters);
        assert!(enrollments[0].is_active);
    }

    #[tokio::test]
    async fn test_link_errors() {
        let db = setup_db().await;
        let fixture = insert_program(&db, "TestX", &[]).await;
        let learner = insert_user(&db, "learner", false).await;
        let other = insert_user(&db, "other", false).await;
        let enrolled = insert_user(&db, "enrolled", false).await;
        insert_program_enrollment(&db, &fixture, Some("taken"), Some(other.id), ProgramEnrollmentStatus::Enrolled)
            .await;
        insert_program_enrollment(&db, &fixture, Some("mine"), Some(learner.id), ProgramEnrollmentStatus::Enrolled)
            .await;
        insert_program_enrollment(&db, &fixture, Some("free"), None, ProgramEnrollmentStatus::Enrolled)
            .await;
        insert_program_enrollment(&db, &fixture, Some("old-key"), Some(enrolled.id), ProgramEnrollmentStatus::Enrolled)
            .await;

        let program_uuid = fixture.program.uuid;
        let errors = LinkingService::link_program_enrollments(
            &db,
            program_uuid,
            &links(&[
                ("ghost-user", "nobody"),
                ("ghost-key", "learner"),
                ("taken", "learner"),
                ("mine", "learner"),
                ("free", "enrolled"),
            ]),
        )
        .await
        .unwrap();

        assert_eq!(errors.len(), 4);
        assert_eq!(errors["ghost-user"], "No user found with username nobody");
        assert_eq!(
            errors["ghost-key"],
            format!("No program enrollment found for program {program_uuid} and key ghost-key")
        );
        assert_eq!(
            errors["taken"],
            "Program enrollment with external_student_key taken is already linked to a different account"
        );
        assert_eq!(
            errors["free"],
            format!("User enrolled already has a program enrollment for program {program_uuid}")
        );
        assert!(!errors.contains_key("mine"));
    }

    #[tokio::test]
    async fn test_failed_learner_is_rolled_back() {
        let db = setup_db().await;
        // The course row is missing, so enrolling fails
        let fixture = insert_program(&db, "TestX", &[COURSE]).await;
        insert_user(&db, "learner", false).await;
        let enrollment = insert_program_enrollment(&db, &fixture, Some("abc"), None, ProgramEnrollmentStatus::Enrolled)
            .await;
        insert_program_course_enrollment(&db, &enrollment, COURSE, None, ProgramCourseEnrollmentStatus::Active)
            .await;

        let errors = LinkingService::link_program_enrollments(
            &db,
            fixture.program.uuid,
            &links(&[("abc", "learner")]),
        )
        .await
        .unwrap();

        assert!(errors["abc"].starts_with("Unable to link abc: "));
        let enrollment = program_enrollment::Entity::find_by_id(enrollment.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(enrollment.user_id, None);
    }

    #[tokio::test]
    async fn test_link_on_social_auth() {
        let db = setup_db().await;
        let fixture = insert_program(&db, "TestX", &[]).await;
        let second = insert_program(&db, "TestX", &[]).await;
        let elsewhere = insert_program(&db, "OtherX", &[]).await;
        let user = insert_user(&db, "learner", false).await;
        for program in [&fixture, &second, &elsewhere] {
            insert_program_enrollment(&db, program, Some("abc"), None, ProgramEnrollmentStatus::Pending)
                .await;
        }

        let uid = format!("{}:abc", fixture.provider_slug);
        let linked = LinkingService::link_waiting_enrollments_for_social_auth(
            &db,
            user.id,
            &fixture.provider_slug,
            &uid,
        )
        .await
        .unwrap();
        assert_eq!(linked, 2);

        let unknown = LinkingService::link_waiting_enrollments_for_social_auth(
            &db,
            user.id,
            "unknown-samlp",
            "unknown-samlp:abc",
        )
        .await
        .unwrap();
        assert_eq!(unknown, 0);
    }
}
