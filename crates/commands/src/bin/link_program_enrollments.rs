use clap::Parser;
use commands::link::{LinkArgs, run};
use log::error;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    commands::init();
    let args = LinkArgs::parse();

    let result = match args.database.connect().await {
        Ok(db) => run(&db, &args).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(errors) if errors.is_empty() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
