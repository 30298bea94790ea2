use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "learning_paths")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    pub price_cents: i64,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::path_courses::Entity")]
    PathCourses,
    #[sea_orm(has_many = "super::path_enrollments::Entity")]
    PathEnrollments,
}

impl Related<super::path_courses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PathCourses.def()
    }
}

impl Related<super::path_enrollments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PathEnrollments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
