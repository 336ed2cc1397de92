use crate::{
    AppState,
    auth::CurrentUser,
    dtos::{
        enrollments::{PaginatedProgramCourseEnrollmentsResponse, ProgramCourseEnrollmentBody},
        pagination::{PaginationMeta, PaginationParams},
    },
    error::{ApiError, ErrorBody},
    routes::write_status_code,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use database::services::{
    catalog::CatalogService,
    program_course_enrollment::{ProgramCourseEnrollmentRequest, ProgramCourseEnrollmentService},
    program_enrollment::WriteResults,
};
use models::{bulk_write::WriteMode, enrollment_status::ProgramCourseEnrollmentStatus};
use std::collections::BTreeMap;
use utoipa_axum::{router::OpenApiRouter, routes};
use uuid::Uuid;

type WriteResponse = (StatusCode, Json<WriteResults<ProgramCourseEnrollmentStatus>>);

pub fn router() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(
        list_program_course_enrollments,
        create_program_course_enrollments,
        update_program_course_enrollments,
        upsert_program_course_enrollments
    ))
}

/// A page of the program learners enrolled in a course run
#[utoipa::path(
    get,
    path = "/programs/{program_uuid}/courses/{course_id}/enrollments",
    params(
        ("program_uuid" = Uuid, Path, description = "Program UUID"),
        ("course_id" = String, Path, description = "Course key"),
        PaginationParams
    ),
    responses(
        (status = 200, description = "Program course enrollments", body = PaginatedProgramCourseEnrollmentsResponse),
        (status = 403, description = "Caller is not staff", body = ErrorBody),
        (status = 404, description = "Program not found or course not in program", body = ErrorBody)
    ),
    security(("jwt" = [])),
    tag = "Program Enrollments"
)]
pub async fn list_program_course_enrollments(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((program_uuid, course_id)): Path<(Uuid, String)>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<PaginatedProgramCourseEnrollmentsResponse>, ApiError> {
    user.require_staff()?;
    let params = params.validate()?;
    CatalogService::get_program(&state.db, program_uuid).await?;
    CatalogService::ensure_course_in_program(&state.db, program_uuid, &course_id).await?;

    let (enrollments, total_items) = ProgramCourseEnrollmentService::fetch_program_course_enrollments(
        &state.db,
        program_uuid,
        &course_id,
        params.page,
        params.per_page,
        false,
    )
    .await?;

    Ok(Json(PaginatedProgramCourseEnrollmentsResponse {
        results: enrollments.into_iter().map(Into::into).collect(),
        pagination: PaginationMeta::new(params, total_items),
    }))
}

async fn write_program_course_enrollments(
    state: AppState,
    user: CurrentUser,
    (program_uuid, course_id): (Uuid, String),
    body: Vec<ProgramCourseEnrollmentBody>,
    mode: WriteMode,
) -> Result<WriteResponse, ApiError> {
    user.require_staff()?;

    let requests: Vec<ProgramCourseEnrollmentRequest> = body.into_iter().map(Into::into).collect();
    let results = ProgramCourseEnrollmentService::write_program_course_enrollments(
        &state.db,
        program_uuid,
        &course_id,
        &requests,
        mode,
    )
    .await?;

    Ok((write_status_code(&results), Json(results)))
}

/// Enrolls program learners in a course run
#[utoipa::path(
    post,
    path = "/programs/{program_uuid}/courses/{course_id}/enrollments",
    params(
        ("program_uuid" = Uuid, Path, description = "Program UUID"),
        ("course_id" = String, Path, description = "Course key")
    ),
    request_body = Vec<ProgramCourseEnrollmentBody>,
    responses(
        (status = 200, description = "Every learner enrolled", body = BTreeMap<String, String>),
        (status = 207, description = "Some learners enrolled", body = BTreeMap<String, String>),
        (status = 404, description = "Program not found or course not in program", body = ErrorBody),
        (status = 413, description = "More than 25 learners", body = ErrorBody),
        (status = 422, description = "No learner enrolled", body = BTreeMap<String, String>)
    ),
    security(("jwt" = [])),
    tag = "Program Enrollments"
)]
pub async fn create_program_course_enrollments(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(path): Path<(Uuid, String)>,
    Json(body): Json<Vec<ProgramCourseEnrollmentBody>>,
) -> Result<WriteResponse, ApiError> {
    write_program_course_enrollments(state, user, path, body, WriteMode::CREATE).await
}

/// Changes the status of existing program course enrollments
#[utoipa::path(
    patch,
    path = "/programs/{program_uuid}/courses/{course_id}/enrollments",
    params(
        ("program_uuid" = Uuid, Path, description = "Program UUID"),
        ("course_id" = String, Path, description = "Course key")
    ),
    request_body = Vec<ProgramCourseEnrollmentBody>,
    responses(
        (status = 200, description = "Every learner updated", body = BTreeMap<String, String>),
        (status = 207, description = "Some learners updated", body = BTreeMap<String, String>),
        (status = 404, description = "Program not found or course not in program", body = ErrorBody),
        (status = 413, description = "More than 25 learners", body = ErrorBody),
        (status = 422, description = "No learner updated", body = BTreeMap<String, String>)
    ),
    security(("jwt" = [])),
    tag = "Program Enrollments"
)]
pub async fn update_program_course_enrollments(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(path): Path<(Uuid, String)>,
    Json(body): Json<Vec<ProgramCourseEnrollmentBody>>,
) -> Result<WriteResponse, ApiError> {
    write_program_course_enrollments(state, user, path, body, WriteMode::UPDATE).await
}

/// Creates or updates program course enrollments
#[utoipa::path(
    put,
    path = "/programs/{program_uuid}/courses/{course_id}/enrollments",
    params(
        ("program_uuid" = Uuid, Path, description = "Program UUID"),
        ("course_id" = String, Path, description = "Course key")
    ),
    request_body = Vec<ProgramCourseEnrollmentBody>,
    responses(
        (status = 200, description = "Every learner written", body = BTreeMap<String, String>),
        (status = 207, description = "Some learners written", body = BTreeMap<String, String>),
        (status = 404, description = "Program not found or course not in program", body = ErrorBody),
        (status = 413, description = "More than 25 learners", body = ErrorBody),
        (status = 422, description = "No learner written", body = BTreeMap<String, String>)
    ),
    security(("jwt" = [])),
    tag = "Program Enrollments"
)]
pub async fn upsert_program_course_enrollments(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(path): Path<(Uuid, String)>,
    Json(body): Json<Vec<ProgramCourseEnrollmentBody>>,
) -> Result<WriteResponse, ApiError> {
    write_program_course_enrollments(state, user, path, body, WriteMode::UPSERT).await
}
