use crate::{
    db::connect,
    entities::{
        course, course_access_role, course_enrollment, course_grade, organization, program,
        program_course_enrollment, program_course_run, program_curriculum, program_enrollment,
        saml_provider, user, user_social_auth,
    },
};
use chrono::{NaiveDateTime, Utc};
use models::enrollment_status::{CourseMode, ProgramCourseEnrollmentStatus, ProgramEnrollmentStatus};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ConnectionTrait, DatabaseConnection, DbBackend, EntityTrait,
    Schema,
};
use serde_json::Value;
use uuid::Uuid;

pub fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

async fn create_table<E: EntityTrait>(db: &DatabaseConnection, schema: &Schema, entity: E) {
    let stmt = schema.create_table_from_entity(entity);
    db.execute(db.get_database_backend().build(&stmt))
        .await
        .unwrap();
}

/// In-memory database with every table created
pub async fn setup_db() -> DatabaseConnection {
    let db = connect("sqlite::memory:").await.unwrap();
    let schema = Schema::new(DbBackend::Sqlite);

    create_table(&db, &schema, course::Entity).await;
    create_table(&db, &schema, user::Entity).await;
    create_table(&db, &schema, organization::Entity).await;
    create_table(&db, &schema, saml_provider::Entity).await;
    create_table(&db, &schema, user_social_auth::Entity).await;
    create_table(&db, &schema, program::Entity).await;
    create_table(&db, &schema, program_curriculum::Entity).await;
    create_table(&db, &schema, program_course_run::Entity).await;
    create_table(&db, &schema, program_enrollment::Entity).await;
    create_table(&db, &schema, course_enrollment::Entity).await;
    create_table(&db, &schema, program_course_enrollment::Entity).await;
    create_table(&db, &schema, course_access_role::Entity).await;
    create_table(&db, &schema, course_grade::Entity).await;

    db
}

pub async fn insert_course(db: &DatabaseConnection, course_key: &str) -> course::Model {
    course::ActiveModel {
        id: Set(course_key.to_string()),
        display_name: Set(format!("Course {course_key}")),
        start_date: Set(None),
        end_date: Set(None),
        self_paced: Set(false),
        tabs: Set(Value::Null),
        syllabus_present: Set(false),
        discussion_link: Set(None),
        hide_progress_tab: Set(false),
        created_at: Set(now()),
        updated_at: Set(now()),
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn insert_user(db: &DatabaseConnection, username: &str, is_staff: bool) -> user::Model {
    user::ActiveModel {
        id: Set(Uuid::new_v4()),
        username: Set(username.to_string()),
        email: Set(format!("{username}@example.com")),
        is_staff: Set(is_staff),
        is_active: Set(true),
        created_at: Set(now()),
    }
    .insert(db)
    .await
    .unwrap()
}

/// A program belonging to an organization with one enabled SAML provider
pub struct ProgramFixture {
    pub organization: organization::Model,
    pub program: program::Model,
    pub curriculum_uuid: Uuid,
    pub provider_slug: String,
}

pub async fn insert_program(
    db: &DatabaseConnection,
    org_short_name: &str,
    course_keys: &[&str],
) -> ProgramFixture {
    let organization = match organization::Entity::find()
        .all(db)
        .await
        .unwrap()
        .into_iter()
        .find(|org| org.short_name == org_short_name)
    {
        Some(organization) => organization,
        None => {
            let organization = organization::ActiveModel {
                id: Set(Uuid::new_v4()),
                short_name: Set(org_short_name.to_string()),
                name: Set(format!("{org_short_name} University")),
            }
            .insert(db)
            .await
            .unwrap();

            saml_provider::ActiveModel {
                id: Set(Uuid::new_v4()),
                organization_id: Set(organization.id),
                slug: Set(format!("{}-samlp", org_short_name.to_lowercase())),
                enabled: Set(true),
            }
            .insert(db)
            .await
            .unwrap();

            organization
        }
    };

    let program = program::ActiveModel {
        uuid: Set(Uuid::new_v4()),
        title: Set(format!("Master of {org_short_name}")),
        marketing_slug: Set(format!("{}-masters", org_short_name.to_lowercase())),
        program_type: Set("masters".to_string()),
        organization_id: Set(organization.id),
    }
    .insert(db)
    .await
    .unwrap();

    let curriculum_uuid = Uuid::new_v4();
    program_curriculum::ActiveModel {
        uuid: Set(curriculum_uuid),
        program_uuid: Set(program.uuid),
        is_active: Set(true),
    }
    .insert(db)
    .await
    .unwrap();

    for course_key in course_keys {
        program_course_run::ActiveModel {
            id: Set(Uuid::new_v4()),
            program_uuid: Set(program.uuid),
            course_key: Set(course_key.to_string()),
        }
        .insert(db)
        .await
        .unwrap();
    }

    ProgramFixture {
        provider_slug: format!("{}-samlp", org_short_name.to_lowercase()),
        organization,
        program,
        curriculum_uuid,
    }
}

pub async fn insert_program_enrollment(
    db: &DatabaseConnection,
    fixture: &ProgramFixture,
    external_user_key: Option<&str>,
    user_id: Option<Uuid>,
    status: ProgramEnrollmentStatus,
) -> program_enrollment::Model {
    program_enrollment::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        external_user_key: Set(external_user_key.map(str::to_string)),
        program_uuid: Set(fixture.program.uuid),
        curriculum_uuid: Set(fixture.curriculum_uuid),
        status: Set(status),
        created_at: Set(now()),
        updated_at: Set(now()),
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn insert_program_course_enrollment(
    db: &DatabaseConnection,
    program_enrollment: &program_enrollment::Model,
    course_key: &str,
    course_enrollment_id: Option<Uuid>,
    status: ProgramCourseEnrollmentStatus,
) -> program_course_enrollment::Model {
    program_course_enrollment::ActiveModel {
        id: Set(Uuid::new_v4()),
        program_enrollment_id: Set(program_enrollment.id),
        course_key: Set(course_key.to_string()),
        course_enrollment_id: Set(course_enrollment_id),
        status: Set(status),
        created_at: Set(now()),
        updated_at: Set(now()),
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn insert_course_enrollment(
    db: &DatabaseConnection,
    user_id: Uuid,
    course_key: &str,
    mode: CourseMode,
    is_active: bool,
) -> course_enrollment::Model {
    course_enrollment::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        course_key: Set(course_key.to_string()),
        mode: Set(mode),
        is_active: Set(is_active),
        created_at: Set(now()),
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn insert_social_auth(
    db: &DatabaseConnection,
    user_id: Uuid,
    provider_slug: &str,
    external_user_key: &str,
) -> user_social_auth::Model {
    user_social_auth::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        provider: Set(provider_slug.to_string()),
        uid: Set(format!("{provider_slug}:{external_user_key}")),
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn insert_course_access_role(
    db: &DatabaseConnection,
    user_id: Uuid,
    course_key: &str,
    role: &str,
) -> course_access_role::Model {
    course_access_role::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        course_key: Set(course_key.to_string()),
        role: Set(role.to_string()),
    }
    .insert(db)
    .await
    .unwrap()
}
