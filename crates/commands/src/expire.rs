use crate::{CommandError, DatabaseArgs};
use chrono::Utc;
use clap::Parser;
use database::services::expiration::{DEFAULT_EXPIRATION_DAYS, ExpirationService, ExpiredEnrollments};
use sea_orm::DatabaseConnection;

/// Removes waiting program enrollments that were never linked to an account
#[derive(Debug, Parser)]
#[command(name = "expire_waiting_enrollments")]
pub struct ExpireArgs {
    #[command(flatten)]
    pub database: DatabaseArgs,

    /// Days without modification after which a waiting enrollment expires
    #[arg(
        long,
        env = "WAITING_ENROLLMENT_EXPIRATION_DAYS",
        default_value_t = DEFAULT_EXPIRATION_DAYS
    )]
    pub expiration_days: i64,
}

pub async fn run(
    db: &DatabaseConnection,
    args: &ExpireArgs,
) -> Result<ExpiredEnrollments, CommandError> {
    Ok(
        ExpirationService::expire_waiting_enrollments(db, args.expiration_days, Utc::now().naive_utc())
            .await?,
    )
}
