use crate::{
    AppState,
    auth::CurrentUser,
    dtos::programs::{ResetRequest, ResetResponse},
    error::{ApiError, ErrorBody},
};
use axum::{Json, extract::State};
use database::services::reset::ResetService;
use log::warn;
use utoipa_axum::{router::OpenApiRouter, routes};

pub fn router() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(reset_organization))
}

/// Removes every learner of an organization, for integration test environments
#[utoipa::path(
    post,
    path = "/integration-reset",
    request_body = ResetRequest,
    responses(
        (status = 200, description = "Organization reset", body = ResetResponse),
        (status = 400, description = "Missing organization", body = ErrorBody),
        (status = 403, description = "Caller is not staff", body = ErrorBody),
        (status = 404, description = "Organization not found", body = ErrorBody),
        (status = 501, description = "Reset is disabled", body = ErrorBody)
    ),
    security(("jwt" = [])),
    tag = "Admin"
)]
pub async fn reset_organization(
    State(state): State<AppState>,
    caller: CurrentUser,
    Json(request): Json<ResetRequest>,
) -> Result<Json<ResetResponse>, ApiError> {
    if !state.config.enable_enrollment_reset {
        return Err(ApiError::NotImplemented(
            "Enrollment reset is not enabled".to_string(),
        ));
    }
    caller.require_staff()?;

    let organization = request
        .organization
        .ok_or_else(|| ApiError::BadRequest("missing organization".to_string()))?;

    warn!("Resetting organization {organization} at the request of {}", caller.0.username);
    let counts = ResetService::reset_organization(&state.db, &organization).await?;

    Ok(Json(counts.into()))
}
