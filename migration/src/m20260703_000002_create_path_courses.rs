use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PathCourses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PathCourses::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PathCourses::PathId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PathCourses::CourseId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PathCourses::OrderIndex)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_path_courses_path_id")
                            .from(PathCourses::Table, PathCourses::PathId)
                            .to(LearningPaths::Table, LearningPaths::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // A course appears at most once per path
        manager
            .create_index(
                Index::create()
                    .name("idx_path_courses_path_course")
                    .table(PathCourses::Table)
                    .col(PathCourses::PathId)
                    .col(PathCourses::CourseId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PathCourses::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum PathCourses {
    Table,
    Id,
    PathId,
    CourseId,
    OrderIndex,
}

#[derive(Iden)]
enum LearningPaths {
    Table,
    Id,
}
