pub use sea_orm_migration::prelude::*;

mod m20260702_000001_create_courses;
mod m20260702_000002_create_course_modules;
mod m20260702_000003_create_lessons;
mod m20260703_000001_create_learning_paths;
mod m20260703_000002_create_path_courses;
mod m20260706_000001_create_quizzes;
mod m20260706_000002_create_quiz_attempts;
mod m20260714_000001_create_orders;
mod m20260714_000002_create_transactions;
mod m20260715_000001_create_enrollments;
mod m20260715_000002_create_lesson_progress;
mod m20260716_000001_create_path_enrollments;
mod m20260716_000002_create_certificates;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260702_000001_create_courses::Migration),
            Box::new(m20260702_000002_create_course_modules::Migration),
            Box::new(m20260702_000003_create_lessons::Migration),
            Box::new(m20260703_000001_create_learning_paths::Migration),
            Box::new(m20260703_000002_create_path_courses::Migration),
            Box::new(m20260706_000001_create_quizzes::Migration),
            Box::new(m20260706_000002_create_quiz_attempts::Migration),
            Box::new(m20260714_000001_create_orders::Migration),
            Box::new(m20260714_000002_create_transactions::Migration),
            Box::new(m20260715_000001_create_enrollments::Migration),
            Box::new(m20260715_000002_create_lesson_progress::Migration),
            Box::new(m20260716_000001_create_path_enrollments::Migration),
            Box::new(m20260716_000002_create_certificates::Migration),
        ]
    }
}
