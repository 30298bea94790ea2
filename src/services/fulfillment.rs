//! Enrollment fulfillment: converts a confirmed order into its enrollment
//! set, and hosts the free/self-serve enrollment path.

use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, Set,
};

use crate::entities::courses::CourseStatus;
use crate::entities::enrollments::EnrollmentStatus;
use crate::entities::{enrollments, orders, path_courses, path_enrollments, prelude::*};
use crate::services::error::DomainError;
use crate::services::notifications::{DomainEvent, NotificationService};

/// Expand a confirmed order into enrollments. Set-idempotent: rows that
/// already exist are left untouched and produce no events. Runs on the
/// caller's connection so it can participate in the settlement transaction.
pub async fn fulfill<C: ConnectionTrait>(
    conn: &C,
    order: &orders::Model,
) -> Result<Vec<DomainEvent>, DomainError> {
    let mut events = Vec::new();

    if let Some(course_id) = order.course_id {
        if ensure_enrollment(conn, order.user_id, course_id).await?.is_some() {
            events.push(DomainEvent::CourseEnrolled {
                user_id: order.user_id,
                course_id,
            });
        }
    } else if let Some(path_id) = order.path_id {
        ensure_path_enrollment(conn, order.user_id, path_id).await?;

        let path_courses = PathCourses::find()
            .filter(path_courses::Column::PathId.eq(path_id))
            .order_by_asc(path_courses::Column::OrderIndex)
            .all(conn)
            .await?;

        for membership in path_courses {
            if ensure_enrollment(conn, order.user_id, membership.course_id)
                .await?
                .is_some()
            {
                events.push(DomainEvent::CourseEnrolled {
                    user_id: order.user_id,
                    course_id: membership.course_id,
                });
            }
        }
    } else {
        // exactly-one-target is enforced at order creation
        return Err(DomainError::NotFound {
            entity: "order target for order",
            id: order.id,
        });
    }

    tracing::info!(
        "fulfilled order {}: {} new enrollment(s)",
        order.id,
        events.len()
    );
    Ok(events)
}

/// Ensure an active enrollment for (user, course). The insert targets the
/// (user_id, course_id) unique index with on-conflict-do-nothing, so two
/// fulfillments racing over the same pair resolve to a single row. A row a
/// prior drop left behind is reactivated.
///
/// Returns the row when this call created or revived it, None when the user
/// already held a live one.
pub async fn ensure_enrollment<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    course_id: i32,
) -> Result<Option<enrollments::Model>, DomainError> {
    let inserted = Enrollments::insert(enrollments::ActiveModel {
        user_id: Set(user_id),
        course_id: Set(course_id),
        status: Set(EnrollmentStatus::Active),
        enrolled_at: Set(Utc::now().into()),
        ..Default::default()
    })
    .on_conflict(
        OnConflict::columns([
            enrollments::Column::UserId,
            enrollments::Column::CourseId,
        ])
        .do_nothing()
        .to_owned(),
    )
    .exec_without_returning(conn)
    .await?;

    let enrollment = Enrollments::find()
        .filter(enrollments::Column::UserId.eq(user_id))
        .filter(enrollments::Column::CourseId.eq(course_id))
        .one(conn)
        .await?
        .ok_or(DomainError::NotFound {
            entity: "enrollment for course",
            id: course_id,
        })?;

    if inserted > 0 {
        return Ok(Some(enrollment));
    }
    if enrollment.status == EnrollmentStatus::Dropped {
        let mut revived = enrollment.into_active_model();
        revived.status = Set(EnrollmentStatus::Active);
        revived.completed_at = Set(None);
        return Ok(Some(revived.update(conn).await?));
    }
    Ok(None)
}

async fn ensure_path_enrollment<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    path_id: i32,
) -> Result<Option<path_enrollments::Model>, DomainError> {
    let inserted = PathEnrollments::insert(path_enrollments::ActiveModel {
        user_id: Set(user_id),
        path_id: Set(path_id),
        status: Set(EnrollmentStatus::Active),
        enrolled_at: Set(Utc::now().into()),
        progress_percentage: Set(0),
        ..Default::default()
    })
    .on_conflict(
        OnConflict::columns([
            path_enrollments::Column::UserId,
            path_enrollments::Column::PathId,
        ])
        .do_nothing()
        .to_owned(),
    )
    .exec_without_returning(conn)
    .await?;

    let path_enrollment = PathEnrollments::find()
        .filter(path_enrollments::Column::UserId.eq(user_id))
        .filter(path_enrollments::Column::PathId.eq(path_id))
        .one(conn)
        .await?
        .ok_or(DomainError::NotFound {
            entity: "enrollment for path",
            id: path_id,
        })?;

    if inserted > 0 {
        return Ok(Some(path_enrollment));
    }
    if path_enrollment.status == EnrollmentStatus::Dropped {
        let mut revived = path_enrollment.into_active_model();
        revived.status = Set(EnrollmentStatus::Active);
        revived.completed_at = Set(None);
        return Ok(Some(revived.update(conn).await?));
    }
    Ok(None)
}

/// Self-serve enrollment for zero-price published courses. Paid courses must
/// go through an order.
pub async fn enroll_free(
    db: &DatabaseConnection,
    notifier: &NotificationService,
    user_id: i32,
    course_id: i32,
) -> Result<enrollments::Model, DomainError> {
    let course = Courses::find_by_id(course_id)
        .one(db)
        .await?
        .ok_or(DomainError::NotFound {
            entity: "course",
            id: course_id,
        })?;

    if course.status != CourseStatus::Published {
        return Err(DomainError::NotPurchasable);
    }
    if course.instructor_id == user_id {
        return Err(DomainError::SelfPurchase);
    }
    if course.price_cents > 0 {
        return Err(DomainError::PurchaseRequired);
    }

    let Some(enrollment) = ensure_enrollment(db, user_id, course_id).await? else {
        return Err(DomainError::AlreadyEnrolled);
    };

    notifier
        .notify(DomainEvent::CourseEnrolled { user_id, course_id })
        .await;
    Ok(enrollment)
}
