use clap::Args;
use database::{db::connect, error::ServiceError};
use sea_orm::{DatabaseConnection, DbErr};
use thiserror::Error;

pub mod expire;
pub mod link;
pub mod reset;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Invalid link '{0}', expected <external_user_key>:<username>")]
    InvalidLink(String),

    #[error("External user key {0} is listed more than once")]
    DuplicateKey(String),

    #[error("Refusing to delete enrollment data without --force")]
    NotForced,

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Db(#[from] DbErr),
}

/// Connection settings shared by every command
#[derive(Debug, Clone, Args)]
pub struct DatabaseArgs {
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: String,
}

impl DatabaseArgs {
    pub async fn connect(&self) -> Result<DatabaseConnection, CommandError> {
        Ok(connect(&self.database_url).await?)
    }
}

/// Loads `.env` and sets up logging; call before parsing arguments
pub fn init() {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}
