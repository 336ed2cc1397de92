use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "courses")]
pub struct Model {
    /// Course key, e.g. `course-v1:edX+DemoX+Demo`
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub display_name: String,
    pub start_date: Option<DateTime>,
    pub end_date: Option<DateTime>,
    pub self_paced: bool,
    /// Serialized tab list, `null` until first initialized
    pub tabs: Json,
    pub syllabus_present: bool,
    pub discussion_link: Option<String>,
    pub hide_progress_tab: bool,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::course_enrollment::Entity")]
    CourseEnrollments,
}

impl Related<super::course_enrollment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CourseEnrollments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
