use crate::m20251019_create_catalog_tables::{Courses, Programs, Users};
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create program_enrollments table
        manager
            .create_table(
                Table::create()
                    .table(ProgramEnrollments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProgramEnrollments::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ProgramEnrollments::UserId).uuid())
                    .col(ColumnDef::new(ProgramEnrollments::ExternalUserKey).string())
                    .col(ColumnDef::new(ProgramEnrollments::ProgramUuid).uuid().not_null())
                    .col(
                        ColumnDef::new(ProgramEnrollments::CurriculumUuid)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProgramEnrollments::Status)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProgramEnrollments::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProgramEnrollments::UpdatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .check(
                        Expr::col(ProgramEnrollments::UserId)
                            .is_not_null()
                            .or(Expr::col(ProgramEnrollments::ExternalUserKey).is_not_null()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-program_enrollments-user_id")
                            .from(ProgramEnrollments::Table, ProgramEnrollments::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-program_enrollments-program_uuid")
                            .from(ProgramEnrollments::Table, ProgramEnrollments::ProgramUuid)
                            .to(Programs::Table, Programs::Uuid)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create course_enrollments table
        manager
            .create_table(
                Table::create()
                    .table(CourseEnrollments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CourseEnrollments::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CourseEnrollments::UserId).uuid().not_null())
                    .col(ColumnDef::new(CourseEnrollments::CourseKey).string().not_null())
                    .col(
                        ColumnDef::new(CourseEnrollments::Mode)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CourseEnrollments::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(CourseEnrollments::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-course_enrollments-user_id")
                            .from(CourseEnrollments::Table, CourseEnrollments::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-course_enrollments-course_key")
                            .from(CourseEnrollments::Table, CourseEnrollments::CourseKey)
                            .to(Courses::Table, Courses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create program_course_enrollments table
        manager
            .create_table(
                Table::create()
                    .table(ProgramCourseEnrollments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProgramCourseEnrollments::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ProgramCourseEnrollments::ProgramEnrollmentId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProgramCourseEnrollments::CourseKey)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ProgramCourseEnrollments::CourseEnrollmentId).uuid())
                    .col(
                        ColumnDef::new(ProgramCourseEnrollments::Status)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProgramCourseEnrollments::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProgramCourseEnrollments::UpdatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-program_course_enrollments-program_enrollment_id")
                            .from(
                                ProgramCourseEnrollments::Table,
                                ProgramCourseEnrollments::ProgramEnrollmentId,
                            )
                            .to(ProgramEnrollments::Table, ProgramEnrollments::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-program_course_enrollments-course_enrollment_id")
                            .from(
                                ProgramCourseEnrollments::Table,
                                ProgramCourseEnrollments::CourseEnrollmentId,
                            )
                            .to(CourseEnrollments::Table, CourseEnrollments::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Create course_grades table
        manager
            .create_table(
                Table::create()
                    .table(CourseGrades::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(CourseGrades::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(CourseGrades::UserId).uuid().not_null())
                    .col(ColumnDef::new(CourseGrades::CourseKey).string().not_null())
                    .col(ColumnDef::new(CourseGrades::Percent).double().not_null())
                    .col(ColumnDef::new(CourseGrades::LetterGrade).string())
                    .col(
                        ColumnDef::new(CourseGrades::Passed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(CourseGrades::Error).text())
                    .col(ColumnDef::new(CourseGrades::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-course_grades-user_id")
                            .from(CourseGrades::Table, CourseGrades::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CourseGrades::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(ProgramCourseEnrollments::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(CourseEnrollments::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(ProgramEnrollments::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(Iden)]
pub enum ProgramEnrollments {
    Table,
    Id,
    UserId,
    ExternalUserKey,
    ProgramUuid,
    CurriculumUuid,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
pub enum CourseEnrollments {
    Table,
    Id,
    UserId,
    CourseKey,
    Mode,
    IsActive,
    CreatedAt,
}

#[derive(Iden)]
pub enum ProgramCourseEnrollments {
    Table,
    Id,
    ProgramEnrollmentId,
    CourseKey,
    CourseEnrollmentId,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
pub enum CourseGrades {
    Table,
    Id,
    UserId,
    CourseKey,
    Percent,
    LetterGrade,
    Passed,
    Error,
    UpdatedAt,
}
