use crate::dtos::pagination::PaginationMeta;
use database::{
    entities::{program_course_enrollment, program_enrollment},
    services::{
        grades::ProgramCourseGrade, program_course_enrollment::ProgramCourseEnrollmentRequest,
        program_enrollment::ProgramEnrollmentRequest,
    },
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// One learner of a program enrollment write
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ProgramEnrollmentBody {
    /// The learner's identifier in the partner's systems
    #[serde(alias = "student_key")]
    pub external_user_key: String,
    /// One of `enrolled`, `pending`, `suspended`, `canceled`, `ended`
    pub status: String,
    /// Required when the learner is not yet enrolled
    pub curriculum_uuid: Option<Uuid>,
}

impl From<ProgramEnrollmentBody> for ProgramEnrollmentRequest {
    fn from(body: ProgramEnrollmentBody) -> Self {
        Self {
            external_user_key: body.external_user_key,
            status: body.status,
            curriculum_uuid: body.curriculum_uuid,
        }
    }
}

/// One learner of a program course enrollment write
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ProgramCourseEnrollmentBody {
    pub student_key: String,
    /// `active` or `inactive`
    pub status: String,
}

impl From<ProgramCourseEnrollmentBody> for ProgramCourseEnrollmentRequest {
    fn from(body: ProgramCourseEnrollmentBody) -> Self {
        Self {
            student_key: body.student_key,
            status: body.status,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProgramEnrollmentResponse {
    pub student_key: Option<String>,
    pub status: String,
    pub account_exists: bool,
    pub curriculum_uuid: Uuid,
}

impl From<program_enrollment::Model> for ProgramEnrollmentResponse {
    fn from(enrollment: program_enrollment::Model) -> Self {
        Self {
            student_key: enrollment.external_user_key,
            status: enrollment.status.as_ref().to_string(),
            account_exists: enrollment.user_id.is_some(),
            curriculum_uuid: enrollment.curriculum_uuid,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedProgramEnrollmentsResponse {
    pub results: Vec<ProgramEnrollmentResponse>,
    pub pagination: PaginationMeta,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProgramCourseEnrollmentResponse {
    pub student_key: Option<String>,
    pub status: String,
    pub account_exists: bool,
    pub curriculum_uuid: Uuid,
}

impl From<(program_course_enrollment::Model, program_enrollment::Model)>
    for ProgramCourseEnrollmentResponse
{
    fn from(
        (course_enrollment, program_enrollment): (
            program_course_enrollment::Model,
            program_enrollment::Model,
        ),
    ) -> Self {
        Self {
            student_key: program_enrollment.external_user_key,
            status: course_enrollment.status.as_ref().to_string(),
            account_exists: program_enrollment.user_id.is_some(),
            curriculum_uuid: program_enrollment.curriculum_uuid,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedProgramCourseEnrollmentsResponse {
    pub results: Vec<ProgramCourseEnrollmentResponse>,
    pub pagination: PaginationMeta,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedGradesResponse {
    /// `{student_key, passed, percent, letter_grade}` or `{student_key, error}`
    #[schema(value_type = Vec<Object>)]
    pub results: Vec<ProgramCourseGrade>,
    pub pagination: PaginationMeta,
}
