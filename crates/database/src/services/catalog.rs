use crate::{
    entities::{
        course_access_role, organization, program, program_course_run, program_enrollment,
        saml_provider, user,
    },
    error::ServiceError,
};
use models::enrollment_status::ProgramEnrollmentStatus;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Roles that give read access to the programs containing a course
const COURSE_STAFF_ROLES: [&str; 2] = ["staff", "instructor"];

/// Program type used when a client doesn't ask for one
pub const DEFAULT_PROGRAM_TYPE: &str = "masters";

pub struct CatalogService;

impl CatalogService {
    pub async fn get_program<C: ConnectionTrait>(
        db: &C,
        program_uuid: Uuid,
    ) -> Result<program::Model, ServiceError> {
        program::Entity::find_by_id(program_uuid)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Program {program_uuid} not found")))
    }

    /// Keys of the course runs that make up a program
    pub async fn program_course_keys<C: ConnectionTrait>(
        db: &C,
        program_uuid: Uuid,
    ) -> Result<Vec<String>, ServiceError> {
        let runs = program_course_run::Entity::find()
            .filter(program_course_run::Column::ProgramUuid.eq(program_uuid))
            .order_by_asc(program_course_run::Column::CourseKey)
            .all(db)
            .await?;

        Ok(runs.into_iter().map(|run| run.course_key).collect())
    }

    /// Fails with `NotFound` unless the course run is part of the program
    pub async fn ensure_course_in_program<C: ConnectionTrait>(
        db: &C,
        program_uuid: Uuid,
        course_key: &str,
    ) -> Result<(), ServiceError> {
        let run = program_course_run::Entity::find()
            .filter(program_course_run::Column::ProgramUuid.eq(program_uuid))
            .filter(program_course_run::Column::CourseKey.eq(course_key))
            .one(db)
            .await?;

        match run {
            Some(_) => Ok(()),
            None => Err(ServiceError::NotFound(format!(
                "Course {course_key} is not part of program {program_uuid}"
            ))),
        }
    }

    pub async fn get_organization<C: ConnectionTrait>(
        db: &C,
        short_name: &str,
    ) -> Result<organization::Model, ServiceError> {
        organization::Entity::find()
            .filter(organization::Column::ShortName.eq(short_name))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Organization {short_name} not found")))
    }

    /// Slugs of the organization's enabled identity providers
    pub async fn provider_slugs<C: ConnectionTrait>(
        db: &C,
        organization_id: Uuid,
    ) -> Result<Vec<String>, ServiceError> {
        let providers = saml_provider::Entity::find()
            .filter(saml_provider::Column::OrganizationId.eq(organization_id))
            .filter(saml_provider::Column::Enabled.eq(true))
            .all(db)
            .await?;

        Ok(providers.into_iter().map(|provider| provider.slug).collect())
    }

    /// Programs the user is actively enrolled in, ordered by title
    pub async fn enrolled_programs<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
    ) -> Result<Vec<program::Model>, ServiceError> {
        let program_uuids: Vec<Uuid> = program_enrollment::Entity::find()
            .filter(program_enrollment::Column::UserId.eq(user_id))
            .filter(program_enrollment::Column::Status.is_in(ProgramEnrollmentStatus::active()))
            .all(db)
            .await?
            .into_iter()
            .map(|enrollment| enrollment.program_uuid)
            .collect();

        Ok(program::Entity::find()
            .filter(program::Column::Uuid.is_in(program_uuids))
            .order_by_asc(program::Column::Title)
            .all(db)
            .await?)
    }

    /// Programs the user may read enrollment data of
    ///
    /// Staff see every program of the type. Everybody else sees the programs
    /// of the courses they teach plus the ones they're actively enrolled in.
    pub async fn programs_with_read_access<C: ConnectionTrait>(
        db: &C,
        user: &user::Model,
        program_type: &str,
    ) -> Result<Vec<program::Model>, ServiceError> {
        let program_type = normalize_program_type(program_type);

        if user.is_staff {
            return Ok(program::Entity::find()
                .filter(program::Column::ProgramType.eq(program_type))
                .order_by_asc(program::Column::Title)
                .all(db)
                .await?);
        }

        let course_keys: Vec<String> = course_access_role::Entity::find()
            .filter(course_access_role::Column::UserId.eq(user.id))
            .filter(course_access_role::Column::Role.is_in(COURSE_STAFF_ROLES))
            .all(db)
            .await?
            .into_iter()
            .map(|role| role.course_key)
            .collect();

        let mut program_uuids: Vec<Uuid> = program_course_run::Entity::find()
            .filter(program_course_run::Column::CourseKey.is_in(course_keys))
            .all(db)
            .await?
            .into_iter()
            .map(|run| run.program_uuid)
            .collect();

        program_uuids.extend(
            program_enrollment::Entity::find()
                .filter(program_enrollment::Column::UserId.eq(user.id))
                .filter(program_enrollment::Column::Status.is_in(ProgramEnrollmentStatus::active()))
                .all(db)
                .await?
                .into_iter()
                .map(|enrollment| enrollment.program_uuid),
        );

        // Deduplicate by uuid, ordered by title for stable output
        let programs: BTreeMap<Uuid, program::Model> = program::Entity::find()
            .filter(program::Column::Uuid.is_in(program_uuids))
            .filter(program::Column::ProgramType.eq(program_type))
            .all(db)
            .await?
            .into_iter()
            .map(|program| (program.uuid, program))
            .collect();

        let mut programs: Vec<_> = programs.into_values().collect();
        programs.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(programs)
    }
}

/// Lowercases a program type and joins its words with dashes
pub fn normalize_program_type(program_type: &str) -> String {
    program_type
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase()
}
