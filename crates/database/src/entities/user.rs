use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub username: String,
    pub email: String,
    pub is_staff: bool,
    pub is_active: bool,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::program_enrollment::Entity")]
    ProgramEnrollments,
    #[sea_orm(has_many = "super::course_enrollment::Entity")]
    CourseEnrollments,
    #[sea_orm(has_many = "super::user_social_auth::Entity")]
    SocialAuths,
}

impl Related<super::program_enrollment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProgramEnrollments.def()
    }
}

impl Related<super::course_enrollment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CourseEnrollments.def()
    }
}

impl Related<super::user_social_auth::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SocialAuths.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
