use crate::{
    entities::{program, program_course_enrollment, program_enrollment},
    error::ServiceError,
    services::{
        catalog::CatalogService, course_enrollment::CourseEnrollmentService,
        program_enrollment::WriteResults,
    },
};
use chrono::Utc;
use log::{error, info, warn};
use models::{
    bulk_write::{
        KeyedRequest, MAX_ENROLLMENT_RECORDS, PlannedWrite, RecordState, TooManyRecords, WriteMode,
        plan_writes,
    },
    enrollment_status::{ProgramCourseEnrollmentStatus, WriteError, WriteStatus},
};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use serde::Deserialize;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProgramCourseEnrollmentRequest {
    pub student_key: String,
    pub status: String,
}

impl KeyedRequest for ProgramCourseEnrollmentRequest {
    fn key(&self) -> &str {
        &self.student_key
    }

    fn raw_status(&self) -> &str {
        &self.status
    }
}

/// A program course enrollment together with the program enrollment it hangs off
pub type EnrollmentPair = (program_course_enrollment::Model, program_enrollment::Model);

pub struct ProgramCourseEnrollmentService;

impl ProgramCourseEnrollmentService {
    /// Creates and/or updates the course enrollments of program learners
    ///
    /// Learners must already be enrolled in the program. Writing a learner
    /// who has an account also writes their course enrollment.
    pub async fn write_program_course_enrollments(
        db: &DatabaseConnection,
        program_uuid: Uuid,
        course_key: &str,
        requests: &[ProgramCourseEnrollmentRequest],
        mode: WriteMode,
    ) -> Result<WriteResults<ProgramCourseEnrollmentStatus>, ServiceError> {
        if requests.len() > MAX_ENROLLMENT_RECORDS {
            return Err(TooManyRecords {
                requested: requests.len(),
            }
            .into());
        }
        let program = CatalogService::get_program(db, program_uuid).await?;
        CatalogService::ensure_course_in_program(db, program_uuid, course_key).await?;

        let keys: Vec<&str> = requests.iter().map(KeyedRequest::key).collect();
        let program_enrollments: HashMap<String, program_enrollment::Model> =
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

        let enrollment_ids: Vec<Uuid> = program_enrollments.values().map(|e| e.id).collect();
        let course_enrollments: HashMap<Uuid, program_course_enrollment::Model> =
            program_course_enrollment::Entity::find()
                .filter(program_course_enrollment::Column::CourseKey.eq(course_key))
                .filter(program_course_enrollment::Column::ProgramEnrollmentId.is_in(enrollment_ids))
                .all(db)
                .await?
                .into_iter()
                .map(|enrollment| (enrollment.program_enrollment_id, enrollment))
                .collect();

        let plan = plan_writes::<_, ProgramCourseEnrollmentStatus, _>(
            requests,
            mode,
            WriteError::NotFound,
            |request| match program_enrollments.get(request.key()) {
                None => RecordState::Rejected(WriteError::NotInProgram),
                Some(enrollment) if course_enrollments.contains_key(&enrollment.id) => {
                    RecordState::Exists
                }
                Some(_) => RecordState::Absent,
            },
        )?;

        let mut results: WriteResults<_> = plan
            .rejected
            .into_iter()
            .map(|(key, error)| (key, error.into()))
            .collect();

        for write in plan.writes {
            let key = write.key().to_string();
            let Some(program_enrollment) = program_enrollments.get(&key) else {
                results.insert(key, WriteError::NotInProgram.into());
                continue;
            };

            let status: ProgramCourseEnrollmentStatus = match &write {
                PlannedWrite::Create { status, .. } | PlannedWrite::Update { status, .. } => *status,
            };
            if status.is_active() && !program_enrollment.status.is_active() {
                warn!(
                    "Refusing to activate {key} in {course_key}: program enrollment is {}",
                    program_enrollment.status.as_ref()
                );
                results.insert(key, WriteError::IllegalOperation.into());
                continue;
            }

            if let PlannedWrite::Create { status, .. } = &write
                && status.is_active()
            {
                match Self::find_conflicting_enrollment(
                    db,
                    program.organization_id,
                    program_enrollment,
                    course_key,
                )
                .await
                {
                    Ok(None) => {}
                    Ok(Some(other)) => {
                        error!(
                            "Cannot enroll {key} in {course_key}: already active through program enrollment {}",
                            other.program_enrollment_id
                        );
                        results.insert(key, WriteError::Conflict.into());
                        continue;
                    }
                    Err(e) => {
                        error!("Failed to check enrollments of {key} in {course_key}: {e}");
                        results.insert(key, WriteError::InternalError.into());
                        continue;
                    }
                }
            }

            let written = match write {
                PlannedWrite::Create { status, .. } => {
                    Self::create_enrollment(db, program_enrollment, course_key, status).await
                }
                PlannedWrite::Update { status, .. } => {
                    match course_enrollments.get(&program_enrollment.id) {
                        Some(enrollment) => {
                            Self::update_enrollment(db, enrollment.clone(), status).await
                        }
                        None => Err(ServiceError::NotFound(key.clone())),
                    }
                }
            };

            let result = match written {
                Ok(enrollment) => {
                    info!(
                        "Wrote program course enrollment {key} in {course_key} as {}",
                        enrollment.status.as_ref()
                    );
                    WriteStatus::Written(enrollment.status)
                }
                Err(e) => {
                    error!("Failed to write program course enrollment {key} in {course_key}: {e}");
                    WriteError::InternalError.into()
                }
            };
            results.insert(key, result);
        }

        Ok(results)
    }

    async fn create_enrollment(
        db: &DatabaseConnection,
        program_enrollment: &program_enrollment::Model,
        course_key: &str,
        status: ProgramCourseEnrollmentStatus,
    ) -> Result<program_course_enrollment::Model, ServiceError> {
        let txn = db.begin().await?;

        let course_enrollment_id = match program_enrollment.user_id {
            Some(user_id) => Some(
                CourseEnrollmentService::enroll_in_masters_track(
                    &txn,
                    user_id,
                    course_key,
                    status.is_active(),
                )
                .await?
                .id,
            ),
            None => None,
        };

        let now = Utc::now().naive_utc();
        let enrollment = program_course_enrollment::ActiveModel {
            id: Set(Uuid::new_v4()),
            program_enrollment_id: Set(program_enrollment.id),
            course_key: Set(course_key.to_string()),
            course_enrollment_id: Set(course_enrollment_id),
            status: Set(status),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        Ok(enrollment)
    }

    async fn update_enrollment(
        db: &DatabaseConnection,
        enrollment: program_course_enrollment::Model,
        status: ProgramCourseEnrollmentStatus,
    ) -> Result<program_course_enrollment::Model, ServiceError> {
        let txn = db.begin().await?;

        if let Some(course_enrollment_id) = enrollment.course_enrollment_id {
            CourseEnrollmentService::set_active(&txn, course_enrollment_id, status.is_active())
                .await?;
        }

        let mut active = enrollment.into_active_model();
        active.status = Set(status);
        active.updated_at = Set(Utc::now().naive_utc());
        let enrollment = active.update(&txn).await?;

        txn.commit().await?;
        Ok(enrollment)
    }

    /// An active seat the same learner holds in the course through another program
    ///
    /// The learner is matched by user once linked. External keys only identify
    /// a learner within one organization, so they are matched against that
    /// organization's programs.
    async fn find_conflicting_enrollment(
        db: &DatabaseConnection,
        organization_id: Uuid,
        program_enrollment: &program_enrollment::Model,
        course_key: &str,
    ) -> Result<Option<program_course_enrollment::Model>, ServiceError> {
        let mut learner = Condition::any();
        if let Some(key) = &program_enrollment.external_user_key {
            let organization_programs: Vec<Uuid> = program::Entity::find()
                .filter(program::Column::OrganizationId.eq(organization_id))
                .all(db)
                .await?
                .into_iter()
                .map(|program| program.uuid)
                .collect();
            learner = learner.add(
                Condition::all()
                    .add(program_enrollment::Column::ExternalUserKey.eq(key.as_str()))
                    .add(program_enrollment::Column::ProgramUuid.is_in(organization_programs)),
            );
        }
        if let Some(user_id) = program_enrollment.user_id {
            learner = learner.add(program_enrollment::Column::UserId.eq(user_id));
        }

        let other_ids: Vec<Uuid> = program_enrollment::Entity::find()
            .filter(program_enrollment::Column::ProgramUuid.ne(program_enrollment.program_uuid))
            .filter(learner)
            .all(db)
            .await?
            .into_iter()
            .map(|enrollment| enrollment.id)
            .collect();
        if other_ids.is_empty() {
            return Ok(None);
        }

        Ok(program_course_enrollment::Entity::find()
            .filter(program_course_enrollment::Column::CourseKey.eq(course_key))
            .filter(program_course_enrollment::Column::Status.eq(ProgramCourseEnrollmentStatus::Active))
            .filter(program_course_enrollment::Column::ProgramEnrollmentId.is_in(other_ids))
            .one(db)
            .await?)
    }

    /// A page of a course's program enrollments and the total count
    pub async fn fetch_program_course_enrollments(
        db: &DatabaseConnection,
        program_uuid: Uuid,
        course_key: &str,
        page: u64,
        per_page: u64,
        linked_only: bool,
    ) -> Result<(Vec<EnrollmentPair>, u64), ServiceError> {
        let mut query = program_course_enrollment::Entity::find()
            .find_also_related(program_enrollment::Entity)
            .filter(program_course_enrollment::Column::CourseKey.eq(course_key))
            .filter(program_enrollment::Column::ProgramUuid.eq(program_uuid))
            .order_by_asc(program_course_enrollment::Column::CreatedAt)
            .order_by_asc(program_course_enrollment::Column::Id);
        if linked_only {
            query = query.filter(program_enrollment::Column::UserId.is_not_null());
        }

        let paginator = query.paginate(db, per_page);
        let total_items = paginator.num_items().await?;
        let enrollments = paginator
            .fetch_page(page.saturating_sub(1))
            .await?
            .into_iter()
            .filter_map(|(course_enrollment, program_enrollment)| {
                program_enrollment.map(|program_enrollment| (course_enrollment, program_enrollment))
            })
            .collect();

        Ok((enrollments, total_items))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        entities::course_enrollment,
        test_util::{
            ProgramFixture, insert_course, insert_course_enrollment, insert_program,
            insert_program_course_enrollment, insert_program_enrollment, insert_user, setup_db,
        },
    };
    use models::enrollment_status::{CourseMode, ProgramEnrollmentStatus};
    use sea_orm::DatabaseConnection;

    const COURSE: &str = "course-v1:TestX+Masters+1";

    fn request(key: &str, status: &str) -> ProgramCourseEnrollmentRequest {
        ProgramCourseEnrollmentRequest {
            student_key: key.to_string(),
            status: status.to_string(),
        }
    }

    async fn setup() -> (DatabaseConnection, ProgramFixture) {
        let db = setup_db().await;
        insert_course(&db, COURSE).await;
        let fixture = insert_program(&db, "TestX", &[COURSE]).await;
        (db, fixture)
    }

    async fn write(
        db: &DatabaseConnection,
        fixture: &ProgramFixture,
        requests: &[ProgramCourseEnrollmentRequest],
        mode: WriteMode,
    ) -> WriteResults<ProgramCourseEnrollmentStatus> {
        ProgramCourseEnrollmentService::write_program_course_enrollments(
            db,
            fixture.program.uuid,
            COURSE,
            requests,
            mode,
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_waiting_and_linked() {
        let (db, fixture) = setup().await;
        let user = insert_user(&db, "learner", false).await;
        insert_program_enrollment(&db, &fixture, Some("waiting"), None, ProgramEnrollmentStatus::Enrolled)
            .await;
        insert_program_enrollment(&db, &fixture, Some("linked"), Some(user.id), ProgramEnrollmentStatus::Enrolled)
            .await;

        let results = write(
            &db,
            &fixture,
            &[
                request("waiting", "active"),
                request("linked", "active"),
                request("stranger", "active"),
            ],
            WriteMode::CREATE,
        )
        .await;

        assert_eq!(results["waiting"], WriteStatus::Written(ProgramCourseEnrollmentStatus::Active));
        assert_eq!(results["linked"], WriteStatus::Written(ProgramCourseEnrollmentStatus::Active));
        assert_eq!(results["stranger"], WriteStatus::Failed(WriteError::NotInProgram));

        let course_enrollments = course_enrollment::Entity::find().all(&db).await.unwrap();
        assert_eq!(course_enrollments.len(), 1);
        assert_eq!(course_enrollments[0].user_id, user.id);
        assert_eq!(course_enrollments[0].mode, CourseMode::Masters);
    }

    #[tokio::test]
    async fn test_update_toggles_course_enrollment() {
        let (db, fixture) = setup().await;
        let user = insert_user(&db, "learner", false).await;
        let program_enrollment = insert_program_enrollment(
            &db,
            &fixture,
            Some("abc"),
            Some(user.id),
            ProgramEnrollmentStatus::Enrolled,
        )
        .await;
        let course_enrollment = insert_course_enrollment(&db, user.id, COURSE, CourseMode::Masters, true).await;
        insert_program_course_enrollment(
            &db,
            &program_enrollment,
            COURSE,
            Some(course_enrollment.id),
            ProgramCourseEnrollmentStatus::Active,
        )
        .await;

        let results = write(&db, &fixture, &[request("abc", "inactive")], WriteMode::UPDATE).await;
        assert_eq!(results["abc"], WriteStatus::Written(ProgramCourseEnrollmentStatus::Inactive));

        let course_enrollment = course_enrollment::Entity::find_by_id(course_enrollment.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert!(!course_enrollment.is_active);
    }

    #[tokio::test]
    async fn test_mode_errors() {
        let (db, fixture) = setup().await;
        let with_course = insert_program_enrollment(&db, &fixture, Some("has-course"), None, ProgramEnrollmentStatus::Enrolled)
            .await;
        insert_program_enrollment(&db, &fixture, Some("no-course"), None, ProgramEnrollmentStatus::Enrolled)
            .await;
        insert_program_course_enrollment(&db, &with_course, COURSE, None, ProgramCourseEnrollmentStatus::Active)
            .await;

        let created = write(
            &db,
            &fixture,
            &[request("has-course", "inactive")],
            WriteMode::CREATE,
        )
        .await;
        assert_eq!(created["has-course"], WriteStatus::Failed(WriteError::Conflict));

        let updated = write(
            &db,
            &fixture,
            &[request("no-course", "inactive"), request("has-course", "dropped")],
            WriteMode::UPDATE,
        )
        .await;
        assert_eq!(updated["no-course"], WriteStatus::Failed(WriteError::NotFound));
        assert_eq!(updated["has-course"], WriteStatus::Failed(WriteError::InvalidStatus));
    }

    #[tokio::test]
    async fn test_active_seat_in_other_program_conflicts() {
        let (db, fixture) = setup().await;
        let other = insert_program(&db, "TestX", &[COURSE]).await;
        let other_enrollment = insert_program_enrollment(&db, &other, Some("abc"), None, ProgramEnrollmentStatus::Enrolled)
            .await;
        let held = insert_program_course_enrollment(
            &db,
            &other_enrollment,
            COURSE,
            None,
            ProgramCourseEnrollmentStatus::Active,
        )
        .await;
        insert_program_enrollment(&db, &fixture, Some("abc"), None, ProgramEnrollmentStatus::Enrolled)
            .await;

        let results = write(&db, &fixture, &[request("abc", "active")], WriteMode::CREATE).await;
        assert_eq!(results["abc"], WriteStatus::Failed(WriteError::Conflict));

        // Once the other program's seat is released the create goes through
        let mut active = held.into_active_model();
        active.status = Set(ProgramCourseEnrollmentStatus::Inactive);
        active.update(&db).await.unwrap();

        let results = write(&db, &fixture, &[request("abc", "active")], WriteMode::CREATE).await;
        assert_eq!(results["abc"], WriteStatus::Written(ProgramCourseEnrollmentStatus::Active));
    }

    #[tokio::test]
    async fn test_same_key_in_other_organization_does_not_conflict() {
        let (db, fixture) = setup().await;
        let other = insert_program(&db, "OtherX", &[COURSE]).await;
        let other_enrollment = insert_program_enrollment(&db, &other, Some("abc"), None, ProgramEnrollmentStatus::Enrolled)
            .await;
        insert_program_course_enrollment(
            &db,
            &other_enrollment,
            COURSE,
            None,
            ProgramCourseEnrollmentStatus::Active,
        )
        .await;
        insert_program_enrollment(&db, &fixture, Some("abc"), None, ProgramEnrollmentStatus::Enrolled)
            .await;

        let results = write(&db, &fixture, &[request("abc", "active")], WriteMode::CREATE).await;
        assert_eq!(results["abc"], WriteStatus::Written(ProgramCourseEnrollmentStatus::Active));
    }

    #[tokio::test]
    async fn test_inactive_program_enrollment_cannot_activate() {
        let (db, fixture) = setup().await;
        insert_program_enrollment(&db, &fixture, Some("abc"), None, ProgramEnrollmentStatus::Canceled)
            .await;

        let results = write(
            &db,
            &fixture,
            &[request("abc", "active")],
            WriteMode::UPSERT,
        )
        .await;
        assert_eq!(results["abc"], WriteStatus::Failed(WriteError::IllegalOperation));

        let results = write(
            &db,
            &fixture,
            &[request("abc", "inactive")],
            WriteMode::UPSERT,
        )
        .await;
        assert_eq!(results["abc"], WriteStatus::Written(ProgramCourseEnrollmentStatus::Inactive));
    }

    #[tokio::test]
    async fn test_course_outside_program() {
        let (db, fixture) = setup().await;

        let result = ProgramCourseEnrollmentService::write_program_course_enrollments(
            &db,
            fixture.program.uuid,
            "course-v1:TestX+Elsewhere+1",
            &[request("abc", "active")],
            WriteMode::CREATE,
        )
        .await;
        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_fetch_program_course_enrollments() {
        let (db, fixture) = setup().await;
        let user = insert_user(&db, "learner", false).await;
        for (key, user_id) in [("a", None), ("b", Some(user.id))] {
            let enrollment = insert_program_enrollment(&db, &fixture, Some(key), user_id, ProgramEnrollmentStatus::Enrolled)
                .await;
            insert_program_course_enrollment(&db, &enrollment, COURSE, None, ProgramCourseEnrollmentStatus::Active)
                .await;
        }

        let (enrollments, total) = ProgramCourseEnrollmentService::fetch_program_course_enrollments(
            &db,
            fixture.program.uuid,
            COURSE,
            1,
            10,
            false,
        )
        .await
        .unwrap();
        assert_eq!(total, 2);
        assert_eq!(enrollments.len(), 2);

        let (enrollments, total) = ProgramCourseEnrollmentService::fetch_program_course_enrollments(
            &db,
            fixture.program.uuid,
            COURSE,
            1,
            10,
            true,
        )
        .await
        .unwrap();
        assert_eq!(total, 1);
        assert_eq!(enrollments[0].1.external_user_key.as_deref(), Some("b"));
    }
}
