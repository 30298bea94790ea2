use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::enrollments::EnrollmentStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "path_enrollments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub path_id: i32,
    pub status: EnrollmentStatus,
    pub enrolled_at: DateTimeWithTimeZone,
    pub completed_at: Option<DateTimeWithTimeZone>,
    pub progress_percentage: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::learning_paths::Entity",
        from = "Column::PathId",
        to = "super::learning_paths::Column::Id"
    )]
    Path,
}

impl Related<super::learning_paths::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Path.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
