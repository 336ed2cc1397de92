use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A program as published by the catalog
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "programs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub uuid: Uuid,
    pub title: String,
    pub marketing_slug: String,
    /// Normalized program type, e.g. `masters`
    pub program_type: String,
    pub organization_id: Uuid,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::organization::Entity",
        from = "Column::OrganizationId",
        to = "super::organization::Column::Id"
    )]
    Organization,
    #[sea_orm(has_many = "super::program_curriculum::Entity")]
    Curricula,
    #[sea_orm(has_many = "super::program_course_run::Entity")]
    CourseRuns,
}

impl Related<super::organization::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Organization.def()
    }
}

impl Related<super::program_curriculum::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Curricula.def()
    }
}

impl Related<super::program_course_run::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CourseRuns.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
