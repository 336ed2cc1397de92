use crate::{CommandError, DatabaseArgs};
use clap::Parser;
use database::services::reset::{ResetCounts, ResetService};
use log::warn;
use sea_orm::DatabaseConnection;
use uuid::Uuid;

/// Deletes every program enrollment of the given programs
#[derive(Debug, Parser)]
#[command(name = "reset_enrollment_data")]
pub struct ResetArgs {
    #[command(flatten)]
    pub database: DatabaseArgs,

    #[arg(required = true, num_args = 1..)]
    pub program_uuids: Vec<Uuid>,

    /// Confirms that the data should really be deleted
    #[arg(long)]
    pub force: bool,
}

pub async fn run(db: &DatabaseConnection, args: &ResetArgs) -> Result<ResetCounts, CommandError> {
    if !args.force {
        return Err(CommandError::NotForced);
    }

    warn!("Deleting enrollment data of {} programs", args.program_uuids.len());
    Ok(ResetService::reset_enrollment_data(db, &args.program_uuids).await?)
}

#[cfg(test)]
mod test {
    use super::*;
    use database::test_util::{insert_program, insert_program_enrollment, setup_db};
    use models::enrollment_status::ProgramEnrollmentStatus;

    #[tokio::test]
    async fn test_run_requires_force() {
        let db = setup_db().await;
        let fixture = insert_program(&db, "TestX", &[]).await;
        insert_program_enrollment(&db, &fixture, Some("abc"), None, ProgramEnrollmentStatus::Enrolled)
            .await;
        let program_uuid = fixture.program.uuid.to_string();

        let args = ResetArgs::parse_from([
            "reset_enrollment_data",
            "--database-url",
            "sqlite::memory:",
            &program_uuid,
        ]);
        assert!(matches!(run(&db, &args).await, Err(CommandError::NotForced)));

        let args = ResetArgs::parse_from([
            "reset_enrollment_data",
            "--database-url",
            "sqlite::memory:",
            "--force",
            &program_uuid,
        ]);
        let counts = run(&db, &args).await.unwrap();
        assert_eq!(counts.program_enrollments, 1);
    }
}
