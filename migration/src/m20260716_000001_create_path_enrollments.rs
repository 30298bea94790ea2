use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PathEnrollments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PathEnrollments::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PathEnrollments::UserId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PathEnrollments::PathId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PathEnrollments::Status)
                            .string_len(32)
                            .not_null()
                            .default("active"),
                    )
                    .col(
                        ColumnDef::new(PathEnrollments::EnrolledAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(SimpleExpr::Keyword(Keyword::CurrentTimestamp)),
                    )
                    .col(
                        ColumnDef::new(PathEnrollments::CompletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PathEnrollments::ProgressPercentage)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_path_enrollments_path_id")
                            .from(PathEnrollments::Table, PathEnrollments::PathId)
                            .to(LearningPaths::Table, LearningPaths::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_path_enrollments_user_path")
                    .table(PathEnrollments::Table)
                    .col(PathEnrollments::UserId)
                    .col(PathEnrollments::PathId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PathEnrollments::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum PathEnrollments {
    Table,
    Id,
    UserId,
    PathId,
    Status,
    EnrolledAt,
    CompletedAt,
    ProgressPercentage,
}

#[derive(Iden)]
enum LearningPaths {
    Table,
    Id,
}
