use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Last computed grade of a learner in a course run
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "course_grades")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub course_key: String,
    #[sea_orm(column_type = "Double")]
    pub percent: f64,
    pub letter_grade: Option<String>,
    pub passed: bool,
    /// Set when grading failed for this learner
    pub error: Option<String>,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
