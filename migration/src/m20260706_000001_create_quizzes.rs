use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Quizzes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Quizzes::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Quizzes::LessonId)
                            .integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Quizzes::Title)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Quizzes::PassingScore)
                            .integer()
                            .not_null()
                            .default(70),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_quizzes_lesson_id")
                            .from(Quizzes::Table, Quizzes::LessonId)
                            .to(Lessons::Table, Lessons::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Quizzes::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Quizzes {
    Table,
    Id,
    LessonId,
    Title,
    PassingScore,
}

#[derive(Iden)]
enum Lessons {
    Table,
    Id,
}
