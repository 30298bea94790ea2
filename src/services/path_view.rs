//! Read-side learning-path projection: per-course lock/unlock/current state,
//! recomputed on each read from enrollments + path membership.

use std::collections::HashMap;

use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};

use crate::entities::enrollments::EnrollmentStatus;
use crate::entities::{courses, enrollments, path_courses, path_enrollments, prelude::*};
use crate::models::path::{PathCourseView, PathViewResponse};
use crate::services::error::DomainError;
use crate::services::progress::progress_percentage;

/// A course is current when it is not completed and either leads the path or
/// directly follows a completed course.
pub fn sequence_current(completed: &[bool]) -> Vec<bool> {
    completed
        .iter()
        .enumerate()
        .map(|(i, &done)| !done && (i == 0 || completed[i - 1]))
        .collect()
}

pub async fn get_path_view(
    db: &DatabaseConnection,
    user_id: i32,
    path_id: i32,
) -> Result<PathViewResponse, DomainError> {
    let path = LearningPaths::find_by_id(path_id)
        .one(db)
        .await?
        .ok_or(DomainError::NotFound {
            entity: "learning path",
            id: path_id,
        })?;

    let memberships = PathCourses::find()
        .filter(path_courses::Column::PathId.eq(path_id))
        .order_by_asc(path_courses::Column::OrderIndex)
        .all(db)
        .await?;
    let course_ids: Vec<i32> = memberships.iter().map(|pc| pc.course_id).collect();

    let courses_by_id: HashMap<i32, courses::Model> = Courses::find()
        .filter(courses::Column::Id.is_in(course_ids.clone()))
        .all(db)
        .await?
        .into_iter()
        .map(|course| (course.id, course))
        .collect();

    let enrollment_status: HashMap<i32, EnrollmentStatus> = Enrollments::find()
        .filter(enrollments::Column::UserId.eq(user_id))
        .filter(enrollments::Column::CourseId.is_in(course_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|enrollment| (enrollment.course_id, enrollment.status))
        .collect();

    // Only overall enrollment gates access; no per-course prerequisite lock
    let is_locked = PathEnrollments::find()
        .filter(path_enrollments::Column::UserId.eq(user_id))
        .filter(path_enrollments::Column::PathId.eq(path_id))
        .one(db)
        .await?
        .is_none();

    let completed_flags: Vec<bool> = memberships
        .iter()
        .map(|pc| enrollment_status.get(&pc.course_id) == Some(&EnrollmentStatus::Completed))
        .collect();
    let current_flags = sequence_current(&completed_flags);

    let course_views: Vec<PathCourseView> = memberships
        .iter()
        .zip(completed_flags.iter().zip(current_flags.iter()))
        .map(|(pc, (&is_completed, &is_current))| PathCourseView {
            course_id: pc.course_id,
            title: courses_by_id
                .get(&pc.course_id)
                .map(|course| course.title.clone())
                .unwrap_or_default(),
            order_index: pc.order_index,
            is_completed,
            is_current,
        })
        .collect();

    let completed_count = completed_flags.iter().filter(|&&done| done).count() as u64;
    let total_count = completed_flags.len() as u64;

    Ok(PathViewResponse {
        path_id,
        title: path.title,
        is_locked,
        progress_percentage: progress_percentage(completed_count, total_count),
        courses: course_views,
    })
}
