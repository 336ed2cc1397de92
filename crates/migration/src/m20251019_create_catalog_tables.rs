use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create courses table
        manager
            .create_table(
                Table::create()
                    .table(Courses::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Courses::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Courses::DisplayName).string().not_null())
                    .col(ColumnDef::new(Courses::StartDate).timestamp())
                    .col(ColumnDef::new(Courses::EndDate).timestamp())
                    .col(
                        ColumnDef::new(Courses::SelfPaced)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Courses::Tabs).json().not_null())
                    .col(
                        ColumnDef::new(Courses::SyllabusPresent)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Courses::DiscussionLink).text())
                    .col(
                        ColumnDef::new(Courses::HideProgressTab)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Courses::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Courses::UpdatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        // Create users table
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Users::Username).string().not_null().unique_key())
                    .col(ColumnDef::new(Users::Email).string().not_null())
                    .col(ColumnDef::new(Users::IsStaff).boolean().not_null().default(false))
                    .col(ColumnDef::new(Users::IsActive).boolean().not_null().default(true))
                    .col(ColumnDef::new(Users::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        // Create organizations table
        manager
            .create_table(
                Table::create()
                    .table(Organizations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Organizations::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Organizations::ShortName)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Organizations::Name).string().not_null())
                    .to_owned(),
            )
            .await?;

        // Create saml_providers table
        manager
            .create_table(
                Table::create()
                    .table(SamlProviders::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SamlProviders::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SamlProviders::OrganizationId).uuid().not_null())
                    .col(
                        ColumnDef::new(SamlProviders::Slug)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(SamlProviders::Enabled)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-saml_providers-organization_id")
                            .from(SamlProviders::Table, SamlProviders::OrganizationId)
                            .to(Organizations::Table, Organizations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create user_social_auths table
        manager
            .create_table(
                Table::create()
                    .table(UserSocialAuths::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserSocialAuths::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UserSocialAuths::UserId).uuid().not_null())
                    .col(ColumnDef::new(UserSocialAuths::Provider).string().not_null())
                    .col(ColumnDef::new(UserSocialAuths::Uid).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-user_social_auths-user_id")
                            .from(UserSocialAuths::Table, UserSocialAuths::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create programs table
        manager
            .create_table(
                Table::create()
                    .table(Programs::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Programs::Uuid).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Programs::Title).string().not_null())
                    .col(ColumnDef::new(Programs::MarketingSlug).string().not_null())
                    .col(ColumnDef::new(Programs::ProgramType).string().not_null())
                    .col(ColumnDef::new(Programs::OrganizationId).uuid().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-programs-organization_id")
                            .from(Programs::Table, Programs::OrganizationId)
                            .to(Organizations::Table, Organizations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create program_curricula table
        manager
            .create_table(
                Table::create()
                    .table(ProgramCurricula::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProgramCurricula::Uuid)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ProgramCurricula::ProgramUuid).uuid().not_null())
                    .col(
                        ColumnDef::new(ProgramCurricula::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-program_curricula-program_uuid")
                            .from(ProgramCurricula::Table, ProgramCurricula::ProgramUuid)
                            .to(Programs::Table, Programs::Uuid)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create program_course_runs table
        manager
            .create_table(
                Table::create()
                    .table(ProgramCourseRuns::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProgramCourseRuns::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ProgramCourseRuns::ProgramUuid).uuid().not_null())
                    .col(ColumnDef::new(ProgramCourseRuns::CourseKey).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-program_course_runs-program_uuid")
                            .from(ProgramCourseRuns::Table, ProgramCourseRuns::ProgramUuid)
                            .to(Programs::Table, Programs::Uuid)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create course_access_roles table
        manager
            .create_table(
                Table::create()
                    .table(CourseAccessRoles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CourseAccessRoles::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CourseAccessRoles::UserId).uuid().not_null())
                    .col(ColumnDef::new(CourseAccessRoles::CourseKey).string().not_null())
                    .col(ColumnDef::new(CourseAccessRoles::Role).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-course_access_roles-user_id")
                            .from(CourseAccessRoles::Table, CourseAccessRoles::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop tables in reverse order due to foreign key constraints
        manager
            .drop_table(Table::drop().table(CourseAccessRoles::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(ProgramCourseRuns::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(ProgramCurricula::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Programs::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(UserSocialAuths::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(SamlProviders::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Organizations::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Courses::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(Iden)]
pub enum Courses {
    Table,
    Id,
    DisplayName,
    StartDate,
    EndDate,
    SelfPaced,
    Tabs,
    SyllabusPresent,
    DiscussionLink,
    HideProgressTab,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
pub enum Users {
    Table,
    Id,
    Username,
    Email,
    IsStaff,
    IsActive,
    CreatedAt,
}

#[derive(Iden)]
enum Organizations {
    Table,
    Id,
    ShortName,
    Name,
}

#[derive(Iden)]
enum SamlProviders {
    Table,
    Id,
    OrganizationId,
    Slug,
    Enabled,
}

#[derive(Iden)]
pub enum UserSocialAuths {
    Table,
    Id,
    UserId,
    Provider,
    Uid,
}

#[derive(Iden)]
pub enum Programs {
    Table,
    Uuid,
    Title,
    MarketingSlug,
    ProgramType,
    OrganizationId,
}

#[derive(Iden)]
enum ProgramCurricula {
    Table,
    Uuid,
    ProgramUuid,
    IsActive,
}

#[derive(Iden)]
pub enum ProgramCourseRuns {
    Table,
    Id,
    ProgramUuid,
    CourseKey,
}

#[derive(Iden)]
pub enum CourseAccessRoles {
    Table,
    Id,
    UserId,
    CourseKey,
    Role,
}
