use crate::{
    AppState,
    auth::CurrentUser,
    dtos::programs::OverviewResponse,
    error::{ApiError, ErrorBody},
};
use axum::{
    Json,
    extract::{Path, State},
};
use chrono::Utc;
use database::services::overview::OverviewService;
use utoipa_axum::{router::OpenApiRouter, routes};
use uuid::Uuid;

pub fn router() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(get_program_overview))
}

/// The caller's course runs in a program
#[utoipa::path(
    get,
    path = "/programs/{program_uuid}/overview",
    params(("program_uuid" = Uuid, Path, description = "Program UUID")),
    responses(
        (status = 200, description = "Course runs of the caller", body = OverviewResponse),
        (status = 401, description = "Not authenticated", body = ErrorBody),
        (status = 403, description = "Caller is not enrolled in the program", body = ErrorBody),
        (status = 404, description = "Program not found", body = ErrorBody)
    ),
    security(("jwt" = [])),
    tag = "Programs"
)]
pub async fn get_program_overview(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(program_uuid): Path<Uuid>,
) -> Result<Json<OverviewResponse>, ApiError> {
    let course_runs = OverviewService::get_enrollment_overviews(
        &state.db,
        user.id,
        program_uuid,
        &state.config.lms_root_url,
        Utc::now(),
    )
    .await?;

    Ok(Json(OverviewResponse { course_runs }))
}
