use chrono::Utc;
use database::services::expiration::ExpirationService;
use log::{error, info};
use sea_orm::DatabaseConnection;
use std::time::Duration;
use tokio::{task::JoinHandle, time};

/// Periodically removes waiting enrollments nobody claimed in time
pub fn spawn_expiration_task(
    db: DatabaseConnection,
    expiration_days: i64,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = time::interval(every);
        info!(
            "Waiting enrollment expiration started ({expiration_days} days, every {}s)",
            every.as_secs()
        );

        loop {
            interval.tick().await;

            match ExpirationService::expire_waiting_enrollments(
                &db,
                expiration_days,
                Utc::now().naive_utc(),
            )
            .await
            {
                Ok(expired) if expired.program_enrollments > 0 => {
                    info!("Expired {} waiting enrollments", expired.program_enrollments)
                }
                Ok(_) => {}
                Err(e) => error!("Failed to expire waiting enrollments: {e}"),
            }
        }
    })
}
