use clap::Parser;
use commands::reset::{ResetArgs, run};
use log::{error, info};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    commands::init();
    let args = ResetArgs::parse();

    let result = match args.database.connect().await {
        Ok(db) => run(&db, &args).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(counts) => {
            info!(
                "Removed {} program enrollments, {} program course enrollments and {} course enrollments",
                counts.program_enrollments, counts.program_course_enrollments, counts.course_enrollments
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
