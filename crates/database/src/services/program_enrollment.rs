use crate::{
    entities::{program, program_enrollment, user_social_auth},
    error::ServiceError,
    services::catalog::CatalogService,
};
use chrono::Utc;
use log::{error, info};
use models::{
    bulk_write::{
        KeyedRequest, MAX_ENROLLMENT_RECORDS, PlannedWrite, RecordState, TooManyRecords, WriteMode,
        plan_writes,
    },
    enrollment_status::{ProgramEnrollmentStatus, WriteError, WriteStatus},
};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder,
};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

/// Per-learner results of a bulk write, keyed by the learner's key
pub type WriteResults<S> = BTreeMap<String, WriteStatus<S>>;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProgramEnrollmentRequest {
    pub external_user_key: String,
    pub status: String,
    /// Required when the request creates an enrollment
    pub curriculum_uuid: Option<Uuid>,
}

impl KeyedRequest for ProgramEnrollmentRequest {
    fn key(&self) -> &str {
        &self.external_user_key
    }

    fn raw_status(&self) -> &str {
        &self.status
    }
}

pub struct ProgramEnrollmentService;

impl ProgramEnrollmentService {
    /// Creates and/or updates the program enrollments of a batch of learners
    ///
    /// Fails as a whole only when the batch is too large, the program is
    /// unknown, or a learner that would be created has no curriculum.
    /// Everything else is reported per learner.
    pub async fn write_program_enrollments(
        db: &DatabaseConnection,
        program_uuid: Uuid,
        requests: &[ProgramEnrollmentRequest],
        mode: WriteMode,
    ) -> Result<WriteResults<ProgramEnrollmentStatus>, ServiceError> {
        if requests.len() > MAX_ENROLLMENT_RECORDS {
            return Err(TooManyRecords {
                requested: requests.len(),
            }
            .into());
        }
        let program = CatalogService::get_program(db, program_uuid).await?;

        let keys: Vec<&str> = requests.iter().map(KeyedRequest::key).collect();
        let existing: HashMap<String, program_enrollment::Model> = program_enrollment::Entity::find()
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

        let plan = plan_writes::<_, ProgramEnrollmentStatus, _>(
            requests,
            mode,
            WriteError::NotInProgram,
            |request| {
                if existing.contains_key(request.key()) {
                    RecordState::Exists
                } else {
                    RecordState::Absent
                }
            },
        )?;

        // Only learners that will actually be created need a curriculum
        if let Some(request) = plan.writes.iter().find_map(|write| match write {
            PlannedWrite::Create { request, .. } if request.curriculum_uuid.is_none() => {
                Some(*request)
            }
            _ => None,
        }) {
            return Err(ServiceError::Validation(format!(
                "curriculum_uuid is required to enroll {}",
                request.external_user_key
            )));
        }

        let create_keys: Vec<&str> = plan
            .writes
            .iter()
            .filter(|write| matches!(write, PlannedWrite::Create { .. }))
            .map(PlannedWrite::key)
            .collect();
        let users = Self::users_by_external_key(db, &program, &create_keys).await?;

        let mut results: WriteResults<_> = plan
            .rejected
            .into_iter()
            .map(|(key, error)| (key, error.into()))
            .collect();

        for write in plan.writes {
            let key = write.key().to_string();
            let written = match write {
                PlannedWrite::Create { request, status } => {
                    let user_id = users.get(request.key()).copied();
                    Self::create_enrollment(db, program_uuid, request, status, user_id).await
                }
                PlannedWrite::Update { request, status } => match existing.get(request.key()) {
                    Some(enrollment) => {
                        Self::update_enrollment(db, enrollment.clone(), request, status).await
                    }
                    None => Err(DbErr::RecordNotFound(key.clone())),
                },
            };

            let result = match written {
                Ok(enrollment) => {
                    info!(
                        "Wrote program enrollment {key} in program {program_uuid} as {}",
                        enrollment.status.as_ref()
                    );
                    WriteStatus::Written(enrollment.status)
                }
                Err(e) => {
                    error!("Failed to write program enrollment {key} in program {program_uuid}: {e}");
                    WriteError::InternalError.into()
                }
            };
            results.insert(key, result);
        }

        Ok(results)
    }

    async fn create_enrollment(
        db: &DatabaseConnection,
        program_uuid: Uuid,
        request: &ProgramEnrollmentRequest,
        status: ProgramEnrollmentStatus,
        user_id: Option<Uuid>,
    ) -> Result<program_enrollment::Model, DbErr> {
        let curriculum_uuid = request
            .curriculum_uuid
            .ok_or_else(|| DbErr::Custom("missing curriculum_uuid".to_string()))?;
        let now = Utc::now().naive_utc();

        if let Some(user_id) = user_id {
            info!(
                "Linking new program enrollment {} to user {user_id}",
                request.external_user_key
            );
        }

        program_enrollment::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            external_user_key: Set(Some(request.external_user_key.clone())),
            program_uuid: Set(program_uuid),
            curriculum_uuid: Set(curriculum_uuid),
            status: Set(status),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await
    }

    async fn update_enrollment(
        db: &DatabaseConnection,
        enrollment: program_enrollment::Model,
        request: &ProgramEnrollmentRequest,
        status: ProgramEnrollmentStatus,
    ) -> Result<program_enrollment::Model, DbErr> {
        let mut active = enrollment.into_active_model();
        active.status = Set(status);
        if let Some(curriculum_uuid) = request.curriculum_uuid {
            active.curriculum_uuid = Set(curriculum_uuid);
        }
        active.updated_at = Set(Utc::now().naive_utc());
        active.update(db).await
    }

    /// Users whose identity-provider account already carries one of the keys
    ///
    /// Users with an enrollment in the program are left out so a new record
    /// never duplicates one of theirs.
    async fn users_by_external_key<C: ConnectionTrait>(
        db: &C,
        program: &program::Model,
        keys: &[&str],
    ) -> Result<HashMap<String, Uuid>, ServiceError> {
        if keys.is_empty() {
            return Ok(HashMap::new());
        }
        let slugs = CatalogService::provider_slugs(db, program.organization_id).await?;
        let uids: Vec<String> = slugs
            .iter()
            .flat_map(|slug| keys.iter().map(move |key| format!("{slug}:{key}")))
            .collect();

        let auths = user_social_auth::Entity::find()
            .filter(user_social_auth::Column::Provider.is_in(slugs))
            .filter(user_social_auth::Column::Uid.is_in(uids))
            .all(db)
            .await?;

        let user_ids: Vec<Uuid> = auths.iter().map(|auth| auth.user_id).collect();
        let enrolled: Vec<Uuid> = program_enrollment::Entity::find()
            .filter(program_enrollment::Column::ProgramUuid.eq(program.uuid))
            .filter(program_enrollment::Column::UserId.is_in(user_ids))
            .all(db)
            .await?
            .into_iter()
            .filter_map(|enrollment| enrollment.user_id)
            .collect();

        Ok(auths
            .into_iter()
            .filter(|auth| !enrolled.contains(&auth.user_id))
            .filter_map(|auth| {
                let (_, key) = auth.uid.split_once(':')?;
                Some((key.to_string(), auth.user_id))
            })
            .collect())
    }

    /// A page of a program's enrollments and the total count
    pub async fn fetch_program_enrollments(
        db: &DatabaseConnection,
        program_uuid: Uuid,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<program_enrollment::Model>, u64), ServiceError> {
        let query = program_enrollment::Entity::find()
            .filter(program_enrollment::Column::ProgramUuid.eq(program_uuid))
            .order_by_asc(program_enrollment::Column::CreatedAt)
            .order_by_asc(program_enrollment::Column::Id);

        let total_items = query.clone().count(db).await?;
        let paginator = query.paginate(db, per_page);
        let enrollments = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((enrollments, total_items))
    }

    /// A learner's enrollments, optionally narrowed to programs and statuses
    pub async fn fetch_program_enrollments_by_student<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        program_uuids: &[Uuid],
        statuses: &[ProgramEnrollmentStatus],
    ) -> Result<Vec<program_enrollment::Model>, ServiceError> {
        let mut query =
            program_enrollment::Entity::find().filter(program_enrollment::Column::UserId.eq(user_id));
        if !program_uuids.is_empty() {
            query = query.filter(program_enrollment::Column::ProgramUuid.is_in(program_uuids.to_vec()));
        }
        if !statuses.is_empty() {
            query = query.filter(program_enrollment::Column::Status.is_in(statuses.to_vec()));
        }

        Ok(query.all(db).await?)
    }
}
