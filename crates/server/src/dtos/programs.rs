use database::{
    entities::program,
    services::{overview::CourseRunOverview, reset::ResetCounts},
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
pub struct ProgramResponse {
    pub uuid: Uuid,
    pub title: String,
    pub slug: String,
    pub program_type: String,
}

impl From<program::Model> for ProgramResponse {
    fn from(program: program::Model) -> Self {
        Self {
            uuid: program.uuid,
            title: program.title,
            slug: program.marketing_slug,
            program_type: program.program_type,
        }
    }
}

/// A program the caller is enrolled in
#[derive(Debug, Serialize, ToSchema)]
pub struct LearnerProgramResponse {
    pub uuid: Uuid,
    pub slug: String,
}

impl From<program::Model> for LearnerProgramResponse {
    fn from(program: program::Model) -> Self {
        Self {
            uuid: program.uuid,
            slug: program.marketing_slug,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ProgramTypeQuery {
    /// Defaults to `masters`
    pub program_type: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OverviewResponse {
    #[schema(value_type = Vec<Object>)]
    pub course_runs: Vec<CourseRunOverview>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SocialAuthRequest {
    pub username: String,
    /// Slug of the identity provider the user signed in with
    pub provider: String,
    /// `<provider slug>:<external user key>`
    pub uid: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SocialAuthResponse {
    pub linked: usize,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ResetRequest {
    pub organization: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ResetResponse {
    pub users: u64,
    pub program_enrollments: u64,
    pub program_course_enrollments: u64,
    pub course_enrollments: u64,
}

impl From<ResetCounts> for ResetResponse {
    fn from(counts: ResetCounts) -> Self {
        Self {
            users: counts.users,
            program_enrollments: counts.program_enrollments,
            program_course_enrollments: counts.program_course_enrollments,
            course_enrollments: counts.course_enrollments,
        }
    }
}
