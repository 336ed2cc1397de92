use crate::{
    AppState,
    auth::CurrentUser,
    dtos::{
        enrollments::PaginatedGradesResponse,
        pagination::{PaginationMeta, PaginationParams},
    },
    error::{ApiError, ErrorBody},
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use database::services::grades::GradeService;
use models::enrollment_status::BatchOutcome;
use utoipa_axum::{router::OpenApiRouter, routes};
use uuid::Uuid;

pub fn router() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(get_program_course_grades))
}

/// A page of the grades of the program's linked learners in a course run
#[utoipa::path(
    get,
    path = "/programs/{program_uuid}/courses/{course_id}/grades",
    params(
        ("program_uuid" = Uuid, Path, description = "Program UUID"),
        ("course_id" = String, Path, description = "Course key"),
        PaginationParams
    ),
    responses(
        (status = 200, description = "Every grade computed", body = PaginatedGradesResponse),
        (status = 204, description = "No linked learners on this page"),
        (status = 207, description = "Some grades failed", body = PaginatedGradesResponse),
        (status = 403, description = "Caller is not staff", body = ErrorBody),
        (status = 404, description = "Program not found or course not in program", body = ErrorBody),
        (status = 422, description = "Every grade failed", body = PaginatedGradesResponse)
    ),
    security(("jwt" = [])),
    tag = "Program Enrollments"
)]
pub async fn get_program_course_grades(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((program_uuid, course_id)): Path<(Uuid, String)>,
    Query(params): Query<PaginationParams>,
) -> Result<Response, ApiError> {
    user.require_staff()?;
    let params = params.validate()?;

    let (grades, total_items) = GradeService::iter_program_course_grades(
        &state.db,
        program_uuid,
        &course_id,
        params.page,
        params.per_page,
    )
    .await?;

    let status = match BatchOutcome::from_flags(grades.iter().map(|grade| !grade.is_error())) {
        BatchOutcome::Empty => return Ok(StatusCode::NO_CONTENT.into_response()),
        BatchOutcome::AllOk => StatusCode::OK,
        BatchOutcome::Partial => StatusCode::MULTI_STATUS,
        BatchOutcome::AllFailed => StatusCode::UNPROCESSABLE_ENTITY,
    };

    let body = PaginatedGradesResponse {
        results: grades,
        pagination: PaginationMeta::new(params, total_items),
    };
    Ok((status, Json(body)).into_response())
}
