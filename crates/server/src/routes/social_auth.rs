use crate::{
    AppState,
    auth::CurrentUser,
    dtos::programs::{SocialAuthRequest, SocialAuthResponse},
    error::{ApiError, ErrorBody},
};
use axum::{Json, extract::State};
use database::{
    error::ServiceError,
    services::{linking::LinkingService, user::UserService},
};
use utoipa_axum::{router::OpenApiRouter, routes};

pub fn router() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(link_social_auth))
}

/// Links waiting enrollments to a user who just signed in through an identity provider
#[utoipa::path(
    post,
    path = "/social_auth",
    request_body = SocialAuthRequest,
    responses(
        (status = 200, description = "Number of enrollments linked", body = SocialAuthResponse),
        (status = 403, description = "Caller is not staff", body = ErrorBody),
        (status = 404, description = "User not found", body = ErrorBody)
    ),
    security(("jwt" = [])),
    tag = "Admin"
)]
pub async fn link_social_auth(
    State(state): State<AppState>,
    caller: CurrentUser,
    Json(request): Json<SocialAuthRequest>,
) -> Result<Json<SocialAuthResponse>, ApiError> {
    caller.require_staff()?;

    let user = UserService::find_by_username(&state.db, &request.username)
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!("No user found with username {}", request.username))
        })?;
    let linked = LinkingService::link_waiting_enrollments_for_social_auth(
        &state.db,
        user.id,
        &request.provider,
        &request.uid,
    )
    .await?;

    Ok(Json(SocialAuthResponse { linked }))
}
