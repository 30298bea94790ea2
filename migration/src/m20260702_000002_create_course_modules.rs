use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CourseModules::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CourseModules::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CourseModules::CourseId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CourseModules::Title)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CourseModules::OrderIndex)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_course_modules_course_id")
                            .from(CourseModules::Table, CourseModules::CourseId)
                            .to(Courses::Table, Courses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_course_modules_course_id")
                    .table(CourseModules::Table)
                    .col(CourseModules::CourseId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CourseModules::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum CourseModules {
    Table,
    Id,
    CourseId,
    Title,
    OrderIndex,
}

#[derive(Iden)]
enum Courses {
    Table,
    Id,
}
