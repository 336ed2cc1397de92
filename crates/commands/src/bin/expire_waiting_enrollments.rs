use clap::Parser;
use commands::expire::{ExpireArgs, run};
use log::{error, info};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    commands::init();
    let args = ExpireArgs::parse();

    let result = match args.database.connect().await {
        Ok(db) => run(&db, &args).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(expired) => {
            info!(
                "Expired {} program enrollments and {} program course enrollments",
                expired.program_enrollments, expired.program_course_enrollments
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
