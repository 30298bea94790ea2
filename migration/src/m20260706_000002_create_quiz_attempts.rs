use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(QuizAttempts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(QuizAttempts::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(QuizAttempts::QuizId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(QuizAttempts::UserId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(QuizAttempts::Score)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(QuizAttempts::Passed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(QuizAttempts::AttemptedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(SimpleExpr::Keyword(Keyword::CurrentTimestamp)),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_quiz_attempts_quiz_id")
                            .from(QuizAttempts::Table, QuizAttempts::QuizId)
                            .to(Quizzes::Table, Quizzes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Quiz-gate lookup path: attempts for (quiz, user)
        manager
            .create_index(
                Index::create()
                    .name("idx_quiz_attempts_quiz_user")
                    .table(QuizAttempts::Table)
                    .col(QuizAttempts::QuizId)
                    .col(QuizAttempts::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(QuizAttempts::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum QuizAttempts {
    Table,
    Id,
    QuizId,
    UserId,
    Score,
    Passed,
    AttemptedAt,
}

#[derive(Iden)]
enum Quizzes {
    Table,
    Id,
}
