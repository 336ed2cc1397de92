use crate::{
    AppState,
    auth::CurrentUser,
    dtos::programs::{LearnerProgramResponse, ProgramResponse, ProgramTypeQuery},
    error::{ApiError, ErrorBody},
};
use axum::{
    Json,
    extract::{Query, State},
};
use database::services::catalog::{CatalogService, DEFAULT_PROGRAM_TYPE};
use utoipa_axum::{router::OpenApiRouter, routes};

pub fn router() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(get_readable_programs))
        .routes(routes!(get_learner_programs))
}

/// Programs whose enrollment data the caller may read
#[utoipa::path(
    get,
    path = "/programs",
    params(ProgramTypeQuery),
    responses(
        (status = 200, description = "Readable programs", body = Vec<ProgramResponse>),
        (status = 401, description = "Not authenticated", body = ErrorBody)
    ),
    security(("jwt" = [])),
    tag = "Programs"
)]
pub async fn get_readable_programs(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ProgramTypeQuery>,
) -> Result<Json<Vec<ProgramResponse>>, ApiError> {
    let program_type = query.program_type.as_deref().unwrap_or(DEFAULT_PROGRAM_TYPE);
    let programs = CatalogService::programs_with_read_access(&state.db, &user, program_type).await?;

    Ok(Json(programs.into_iter().map(Into::into).collect()))
}

/// Programs the caller is enrolled in
#[utoipa::path(
    get,
    path = "/programs/enrollments",
    responses(
        (status = 200, description = "Programs of the caller", body = Vec<LearnerProgramResponse>),
        (status = 401, description = "Not authenticated", body = ErrorBody)
    ),
    security(("jwt" = [])),
    tag = "Programs"
)]
pub async fn get_learner_programs(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<LearnerProgramResponse>>, ApiError> {
    let programs = CatalogService::enrolled_programs(&state.db, user.id).await?;

    Ok(Json(programs.into_iter().map(Into::into).collect()))
}
