use crate::{
    AppState,
    auth::CurrentUser,
    dtos::{
        enrollments::{PaginatedProgramEnrollmentsResponse, ProgramEnrollmentBody},
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
    program_enrollment::{ProgramEnrollmentRequest, ProgramEnrollmentService, WriteResults},
};
use models::{bulk_write::WriteMode, enrollment_status::ProgramEnrollmentStatus};
use std::collections::BTreeMap;
use utoipa_axum::{router::OpenApiRouter, routes};
use uuid::Uuid;

type WriteResponse = (StatusCode, Json<WriteResults<ProgramEnrollmentStatus>>);

pub fn router() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(
        list_program_enrollments,
        create_program_enrollments,
        update_program_enrollments,
        upsert_program_enrollments
    ))
}

/// A page of the program's enrollments
#[utoipa::path(
    get,
    path = "/programs/{program_uuid}/enrollments",
    params(("program_uuid" = Uuid, Path, description = "Program UUID"), PaginationParams),
    responses(
        (status = 200, description = "Program enrollments", body = PaginatedProgramEnrollmentsResponse),
        (status = 401, description = "Not authenticated", body = ErrorBody),
        (status = 403, description = "Caller is not staff", body = ErrorBody),
        (status = 404, description = "Program not found", body = ErrorBody)
    ),
    security(("jwt" = [])),
    tag = "Program Enrollments"
)]
pub async fn list_program_enrollments(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(program_uuid): Path<Uuid>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<PaginatedProgramEnrollmentsResponse>, ApiError> {
    user.require_staff()?;
    let params = params.validate()?;
    CatalogService::get_program(&state.db, program_uuid).await?;

    let (enrollments, total_items) = ProgramEnrollmentService::fetch_program_enrollments(
        &state.db,
        program_uuid,
        params.page,
        params.per_page,
    )
    .await?;

    Ok(Json(PaginatedProgramEnrollmentsResponse {
        results: enrollments.into_iter().map(Into::into).collect(),
        pagination: PaginationMeta::new(params, total_items),
    }))
}

async fn write_program_enrollments(
    state: AppState,
    user: CurrentUser,
    program_uuid: Uuid,
    body: Vec<ProgramEnrollmentBody>,
    mode: WriteMode,
) -> Result<WriteResponse, ApiError> {
    user.require_staff()?;

    let requests: Vec<ProgramEnrollmentRequest> = body.into_iter().map(Into::into).collect();
    let results = ProgramEnrollmentService::write_program_enrollments(
        &state.db,
        program_uuid,
        &requests,
        mode,
    )
    .await?;

    Ok((write_status_code(&results), Json(results)))
}

/// Enrolls new learners in the program
#[utoipa::path(
    post,
    path = "/programs/{program_uuid}/enrollments",
    params(("program_uuid" = Uuid, Path, description = "Program UUID")),
    request_body = Vec<ProgramEnrollmentBody>,
    responses(
        (status = 200, description = "Every learner enrolled", body = BTreeMap<String, String>),
        (status = 207, description = "Some learners enrolled", body = BTreeMap<String, String>),
        (status = 400, description = "A new learner has no curriculum", body = ErrorBody),
        (status = 404, description = "Program not found", body = ErrorBody),
        (status = 413, description = "More than 25 learners", body = ErrorBody),
        (status = 422, description = "No learner enrolled", body = BTreeMap<String, String>)
    ),
    security(("jwt" = [])),
    tag = "Program Enrollments"
)]
pub async fn create_program_enrollments(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(program_uuid): Path<Uuid>,
    Json(body): Json<Vec<ProgramEnrollmentBody>>,
) -> Result<WriteResponse, ApiError> {
    write_program_enrollments(state, user, program_uuid, body, WriteMode::CREATE).await
}

/// Changes the status of existing program enrollments
#[utoipa::path(
    patch,
    path = "/programs/{program_uuid}/enrollments",
    params(("program_uuid" = Uuid, Path, description = "Program UUID")),
    request_body = Vec<ProgramEnrollmentBody>,
    responses(
        (status = 200, description = "Every learner updated", body = BTreeMap<String, String>),
        (status = 207, description = "Some learners updated", body = BTreeMap<String, String>),
        (status = 404, description = "Program not found", body = ErrorBody),
        (status = 413, description = "More than 25 learners", body = ErrorBody),
        (status = 422, description = "No learner updated", body = BTreeMap<String, String>)
    ),
    security(("jwt" = [])),
    tag = "Program Enrollments"
)]
pub async fn update_program_enrollments(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(program_uuid): Path<Uuid>,
    Json(body): Json<Vec<ProgramEnrollmentBody>>,
) -> Result<WriteResponse, ApiError> {
    write_program_enrollments(state, user, program_uuid, body, WriteMode::UPDATE).await
}

/// Creates or updates program enrollments
#[utoipa::path(
    put,
    path = "/programs/{program_uuid}/enrollments",
    params(("program_uuid" = Uuid, Path, description = "Program UUID")),
    request_body = Vec<ProgramEnrollmentBody>,
    responses(
        (status = 200, description = "Every learner written", body = BTreeMap<String, String>),
        (status = 207, description = "Some learners written", body = BTreeMap<String, String>),
        (status = 400, description = "A new learner has no curriculum", body = ErrorBody),
        (status = 404, description = "Program not found", body = ErrorBody),
        (status = 413, description = "More than 25 learners", body = ErrorBody),
        (status = 422, description = "No learner written", body = BTreeMap<String, String>)
    ),
    security(("jwt" = [])),
    tag = "Program Enrollments"
)]
pub async fn upsert_program_enrollments(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(program_uuid): Path<Uuid>,
    Json(body): Json<Vec<ProgramEnrollmentBody>>,
) -> Result<WriteResponse, ApiError> {
    write_program_enrollments(state, user, program_uuid, body, WriteMode::UPSERT).await
}
