use models::{
    bulk_write::TooManyRecords,
    tab::InvalidTabsError,
    tab_list::TabEditError,
};
use sea_orm::DbErr;
use thiserror::Error;

/// Errors raised by the service layer
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Db(#[from] DbErr),

    #[error("{0}")]
    NotFound(String),

    /// The request is malformed as a whole
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Forbidden(String),

    #[error(transparent)]
    TooLarge(#[from] TooManyRecords),

    #[error(transparent)]
    Tabs(#[from] TabEditError),

    /// Stored tabs failed to load
    #[error("Course has invalid tabs: {0}")]
    InvalidTabs(#[from] InvalidTabsError),
}
