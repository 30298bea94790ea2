use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(LessonProgress::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LessonProgress::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(LessonProgress::EnrollmentId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LessonProgress::LessonId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LessonProgress::IsCompleted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(LessonProgress::LastWatchedPosition)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(LessonProgress::LastAccessedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(SimpleExpr::Keyword(Keyword::CurrentTimestamp)),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_lesson_progress_enrollment_id")
                            .from(LessonProgress::Table, LessonProgress::EnrollmentId)
                            .to(Enrollments::Table, Enrollments::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Completion counting depends on one row per (enrollment, lesson)
        manager
            .create_index(
                Index::create()
                    .name("idx_lesson_progress_enrollment_lesson")
                    .table(LessonProgress::Table)
                    .col(LessonProgress::EnrollmentId)
                    .col(LessonProgress::LessonId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(LessonProgress::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum LessonProgress {
    Table,
    Id,
    EnrollmentId,
    LessonId,
    IsCompleted,
    LastWatchedPosition,
    LastAccessedAt,
}

#[derive(Iden)]
enum Enrollments {
    Table,
    Id,
}
