use crate::{
    entities::{program_course_enrollment, program_enrollment},
    error::ServiceError,
};
use chrono::{Duration, NaiveDateTime};
use log::info;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, TransactionTrait};
use serde::Serialize;
use uuid::Uuid;

/// Days a waiting enrollment may go untouched before it is removed
pub const DEFAULT_EXPIRATION_DAYS: i64 = 60;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExpiredEnrollments {
    pub program_enrollments: u64,
    pub program_course_enrollments: u64,
}

pub struct ExpirationService;

impl ExpirationService {
    /// Deletes waiting enrollments not modified within `expiration_days` of `now`
    ///
    /// Their program course enrollments go with them.
    pub async fn expire_waiting_enrollments(
        db: &DatabaseConnection,
        expiration_days: i64,
        now: NaiveDateTime,
    ) -> Result<ExpiredEnrollments, ServiceError> {
        let cutoff = now - Duration::days(expiration_days);

        let expired = program_enrollment::Entity::find()
            .filter(program_enrollment::Column::UserId.is_null())
            .filter(program_enrollment::Column::UpdatedAt.lt(cutoff))
            .all(db)
            .await?;
        if expired.is_empty() {
            info!("No waiting enrollments older than {expiration_days} days");
            return Ok(ExpiredEnrollments::default());
        }

        for enrollment in &expired {
            info!(
                "Expiring waiting enrollment {} in program {} (last modified {})",
                enrollment.external_user_key.as_deref().unwrap_or_default(),
                enrollment.program_uuid,
                enrollment.updated_at
            );
        }
        let ids: Vec<Uuid> = expired.iter().map(|enrollment| enrollment.id).collect();

        let txn = db.begin().await?;
        let course_result = program_course_enrollment::Entity::delete_many()
            .filter(program_course_enrollment::Column::ProgramEnrollmentId.is_in(ids.clone()))
            .exec(&txn)
            .await?;
        let program_result = program_enrollment::Entity::delete_many()
            .filter(program_enrollment::Column::Id.is_in(ids))
            .exec(&txn)
            .await?;
        txn.commit().await?;

        let counts = ExpiredEnrollments {
            program_enrollments: program_result.rows_affected,
            program_course_enrollments: course_result.rows_affected,
        };
        info!(
            "Removed {} expired program enrollments and {} program course enrollments",
            counts.program_enrollments, counts.program_course_enrollments
        );
        Ok(counts)
    }
}
