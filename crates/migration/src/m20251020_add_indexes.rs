use crate::{
    m20251019_create_catalog_tables::{CourseAccessRoles, ProgramCourseRuns, UserSocialAuths},
    m20251019_create_enrollment_tables::{
        CourseEnrollments, CourseGrades, ProgramCourseEnrollments, ProgramEnrollments,
    },
};
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // One enrollment per learner, program and curriculum
        manager
            .create_index(
                Index::create()
                    .name("idx_program_enrollments_learner")
                    .table(ProgramEnrollments::Table)
                    .col(ProgramEnrollments::UserId)
                    .col(ProgramEnrollments::ExternalUserKey)
                    .col(ProgramEnrollments::ProgramUuid)
                    .col(ProgramEnrollments::CurriculumUuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Lookups by key during bulk writes and linking
        manager
            .create_index(
                Index::create()
                    .name("idx_program_enrollments_program_key")
                    .table(ProgramEnrollments::Table)
                    .col(ProgramEnrollments::ProgramUuid)
                    .col(ProgramEnrollments::ExternalUserKey)
                    .to_owned(),
            )
            .await?;

        // Expiry scans waiting enrollments by modification time
        manager
            .create_index(
                Index::create()
                    .name("idx_program_enrollments_updated_at")
                    .table(ProgramEnrollments::Table)
                    .col(ProgramEnrollments::UpdatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_program_course_enrollments_enrollment_course")
                    .table(ProgramCourseEnrollments::Table)
                    .col(ProgramCourseEnrollments::ProgramEnrollmentId)
                    .col(ProgramCourseEnrollments::CourseKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_course_enrollments_user_course")
                    .table(CourseEnrollments::Table)
                    .col(CourseEnrollments::UserId)
                    .col(CourseEnrollments::CourseKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_course_grades_user_course")
                    .table(CourseGrades::Table)
                    .col(CourseGrades::UserId)
                    .col(CourseGrades::CourseKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_user_social_auths_provider_uid")
                    .table(UserSocialAuths::Table)
                    .col(UserSocialAuths::Provider)
                    .col(UserSocialAuths::Uid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_program_course_runs_program_course")
                    .table(ProgramCourseRuns::Table)
                    .col(ProgramCourseRuns::ProgramUuid)
                    .col(ProgramCourseRuns::CourseKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_course_access_roles_user_course")
                    .table(CourseAccessRoles::Table)
                    .col(CourseAccessRoles::UserId)
                    .col(CourseAccessRoles::CourseKey)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop indexes in reverse order
        for name in [
            "idx_course_access_roles_user_course",
            "idx_program_course_runs_program_course",
            "idx_user_social_auths_provider_uid",
            "idx_course_grades_user_course",
            "idx_course_enrollments_user_course",
            "idx_program_course_enrollments_enrollment_course",
            "idx_program_enrollments_updated_at",
            "idx_program_enrollments_program_key",
            "idx_program_enrollments_learner",
        ] {
            manager
                .drop_index(Index::drop().name(name).to_owned())
                .await?;
        }

        Ok(())
    }
}
