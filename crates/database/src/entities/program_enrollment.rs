use models::enrollment_status::ProgramEnrollmentStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A learner's enrollment in a program
///
/// Either `user_id` or `external_user_key` is set. Rows with only an
/// external key are "waiting" until the learner links an account.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "program_enrollments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub external_user_key: Option<String>,
    pub program_uuid: Uuid,
    pub curriculum_uuid: Uuid,
    pub status: ProgramEnrollmentStatus,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Model {
    pub fn is_waiting(&self) -> bool {
        self.user_id.is_none()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
    #[sea_orm(has_many = "super::program_course_enrollment::Entity")]
    ProgramCourseEnrollments,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::program_course_enrollment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProgramCourseEnrollments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
