use crate::{
    AppState,
    auth::CurrentUser,
    dtos::tabs::{ReorderTabsRequest, TabListResponse, TabSettingsRequest},
    error::{ApiError, ErrorBody},
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use database::services::tabs::TabService;
use models::tab_list::TabLocator;
use utoipa_axum::{router::OpenApiRouter, routes};

pub fn router() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(get_tabs))
        .routes(routes!(get_displayable_tabs))
        .routes(routes!(reorder_tabs))
        .routes(routes!(update_tab_settings))
}

async fn ensure_can_edit(
    state: &AppState,
    CurrentUser(user): &CurrentUser,
    course_id: &str,
) -> Result<(), ApiError> {
    if TabService::can_edit(&state.db, user, course_id).await? {
        Ok(())
    } else {
        Err(ApiError::Forbidden(format!(
            "User {} cannot edit the tabs of {course_id}",
            user.username
        )))
    }
}

/// All tabs of a course in display order, hidden ones included
#[utoipa::path(
    get,
    path = "/courses/{course_id}/tabs",
    params(("course_id" = String, Path, description = "Course key")),
    responses(
        (status = 200, description = "Tabs of the course", body = TabListResponse),
        (status = 401, description = "Not authenticated", body = ErrorBody),
        (status = 403, description = "Not course staff", body = ErrorBody),
        (status = 404, description = "Course not found", body = ErrorBody)
    ),
    security(("jwt" = [])),
    tag = "Tabs"
)]
pub async fn get_tabs(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(course_id): Path<String>,
) -> Result<Json<TabListResponse>, ApiError> {
    let (_, tabs) = TabService::get_tabs(&state.db, &state.registry, &course_id).await?;
    ensure_can_edit(&state, &user, &course_id).await?;

    Ok(Json(tabs.tabs().iter().collect()))
}

/// Tabs the caller can see in the course navigation
#[utoipa::path(
    get,
    path = "/courses/{course_id}/tabs/displayable",
    params(("course_id" = String, Path, description = "Course key")),
    responses(
        (status = 200, description = "Visible tabs", body = TabListResponse),
        (status = 404, description = "Course not found", body = ErrorBody)
    ),
    security(("jwt" = [])),
    tag = "Tabs"
)]
pub async fn get_displayable_tabs(
    State(state): State<AppState>,
    user: Option<CurrentUser>,
    Path(course_id): Path<String>,
) -> Result<Json<TabListResponse>, ApiError> {
    let user = user.map(|CurrentUser(user)| user);
    let tabs =
        TabService::get_displayable_tabs(&state.db, &state.registry, &course_id, user.as_ref())
            .await?;

    Ok(Json(tabs.iter().collect()))
}

/// Moves the listed tabs to the front in the given order
///
/// Tabs that aren't listed keep their relative order after the listed ones.
#[utoipa::path(
    post,
    path = "/courses/{course_id}/tabs/reorder",
    params(("course_id" = String, Path, description = "Course key")),
    request_body = ReorderTabsRequest,
    responses(
        (status = 204, description = "Tabs reordered"),
        (status = 400, description = "Unknown tab or invalid resulting order", body = ErrorBody),
        (status = 403, description = "Not course staff", body = ErrorBody),
        (status = 404, description = "Course not found", body = ErrorBody)
    ),
    security(("jwt" = [])),
    tag = "Tabs"
)]
pub async fn reorder_tabs(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(course_id): Path<String>,
    Json(request): Json<ReorderTabsRequest>,
) -> Result<StatusCode, ApiError> {
    TabService::get_course(&state.db, &course_id).await?;
    ensure_can_edit(&state, &user, &course_id).await?;

    let locators = request
        .tabs
        .into_iter()
        .map(TabLocator::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    TabService::reorder_tabs(&state.db, &state.registry, &course_id, &locators).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Hides or shows a tab
#[utoipa::path(
    post,
    path = "/courses/{course_id}/tabs/settings",
    params(("course_id" = String, Path, description = "Course key")),
    request_body = TabSettingsRequest,
    responses(
        (status = 204, description = "Tab updated"),
        (status = 400, description = "Unknown tab or tab can't be hidden", body = ErrorBody),
        (status = 403, description = "Not course staff", body = ErrorBody),
        (status = 404, description = "Course not found", body = ErrorBody)
    ),
    security(("jwt" = [])),
    tag = "Tabs"
)]
pub async fn update_tab_settings(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(course_id): Path<String>,
    Json(request): Json<TabSettingsRequest>,
) -> Result<StatusCode, ApiError> {
    TabService::get_course(&state.db, &course_id).await?;
    ensure_can_edit(&state, &user, &course_id).await?;

    let locator = TabLocator::try_from(request.locator)?;
    TabService::set_tab_visibility(
        &state.db,
        &state.registry,
        &course_id,
        &locator,
        request.is_hidden,
    )
    .await?;

    Ok(StatusCode::NO_CONTENT)
}
