use models::enrollment_status::ProgramCourseEnrollmentStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A program learner's seat in one course run
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "program_course_enrollments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub program_enrollment_id: Uuid,
    pub course_key: String,
    /// Set once the learner has an account to enroll
    pub course_enrollment_id: Option<Uuid>,
    pub status: ProgramCourseEnrollmentStatus,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::program_enrollment::Entity",
        from = "Column::ProgramEnrollmentId",
        to = "super::program_enrollment::Column::Id"
    )]
    ProgramEnrollment,
    #[sea_orm(
        belongs_to = "super::course_enrollment::Entity",
        from = "Column::CourseEnrollmentId",
        to = "super::course_enrollment::Column::Id"
    )]
    CourseEnrollment,
}

impl Related<super::program_enrollment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProgramEnrollment.def()
    }
}

impl Related<super::course_enrollment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CourseEnrollment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
