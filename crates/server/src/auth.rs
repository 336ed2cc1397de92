use crate::{AppState, error::ApiError};
use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use database::{entities::user, services::user::UserService};
use tower_oauth2_resource_server::claims::DefaultClaims;

/// Username of the authenticated caller, taken from the JWT subject
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requester(pub String);

/// Copies the subject of validated JWT claims into a [`Requester`] extension
pub async fn identify_requester(mut request: Request, next: Next) -> Response {
    let subject = request
        .extensions()
        .get::<DefaultClaims>()
        .and_then(|claims| claims.sub.clone());
    if let Some(username) = subject {
        request.extensions_mut().insert(Requester(username));
    }

    next.run(request).await
}

impl<S: Send + Sync> FromRequestParts<S> for Requester {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Requester>()
            .cloned()
            .ok_or(ApiError::Unauthorized)
    }
}

/// The platform account of the caller
#[derive(Debug, Clone)]
pub struct CurrentUser(pub user::Model);

impl CurrentUser {
    pub fn require_staff(&self) -> Result<(), ApiError> {
        if self.0.is_staff {
            Ok(())
        } else {
            Err(ApiError::Forbidden(format!(
                "User {} lacks access to this resource",
                self.0.username
            )))
        }
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Requester(username) = Requester::from_request_parts(parts, state).await?;
        UserService::find_by_username(&state.db, &username)
            .await?
            .map(CurrentUser)
            .ok_or(ApiError::Unauthorized)
    }
}

impl OptionalFromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Option<Self>, Self::Rejection> {
        let Some(Requester(username)) = parts.extensions.get::<Requester>().cloned() else {
            return Ok(None);
        };
        Ok(UserService::find_by_username(&state.db, &username)
            .await?
            .map(CurrentUser))
    }
}
