use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use database::error::ServiceError;
use log::error;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// Body of every error response
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub developer_message: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication credentials were not provided.")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotImplemented(String),

    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
            Self::Service(err) => match err {
                ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
                ServiceError::Validation(_) | ServiceError::Tabs(_) => StatusCode::BAD_REQUEST,
                ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
                ServiceError::TooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
                ServiceError::Db(_) | ServiceError::InvalidTabs(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let developer_message = if status.is_server_error() && status != StatusCode::NOT_IMPLEMENTED
        {
            error!("Request failed: {self}");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(ErrorBody { developer_message })).into_response()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use models::{bulk_write::TooManyRecords, tab_list::TabEditError};
    use sea_orm::DbErr;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::Unauthorized, StatusCode::UNAUTHORIZED),
            (
                ServiceError::NotFound("Program x not found".to_string()).into(),
                StatusCode::NOT_FOUND,
            ),
            (
                ServiceError::TooLarge(TooManyRecords { requested: 26 }).into(),
                StatusCode::PAYLOAD_TOO_LARGE,
            ),
            (
                ServiceError::Tabs(TabEditError::NotHideable("courseware".to_string())).into(),
                StatusCode::BAD_REQUEST,
            ),
            (
                ServiceError::Db(DbErr::Custom("boom".to_string())).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, status) in cases {
            assert_eq!(error.status(), status);
        }
    }

    #[test]
    fn test_messages() {
        let error: ApiError = ServiceError::Tabs(TabEditError::UnknownTab("nope".to_string())).into();
        assert_eq!(error.to_string(), "Tab with id_locator 'nope' does not exist.");

        let error: ApiError = ServiceError::TooLarge(TooManyRecords { requested: 30 }).into();
        assert_eq!(error.to_string(), "30 enrollments requested, but limit is 25.");
    }
}
