//! Order creation and read-side order queries

use chrono::{Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::entities::courses::CourseStatus;
use crate::entities::enrollments::EnrollmentStatus;
use crate::entities::orders::OrderStatus;
use crate::entities::{enrollments, orders, path_enrollments, prelude::*};
use crate::services::error::DomainError;

/// Pending orders expire 30 minutes after creation
pub const ORDER_TTL_MINUTES: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderTarget {
    Course(i32),
    Path(i32),
}

/// Create a pending purchase order for a course or a learning path.
///
/// Validation order: target exists and is purchasable, then self-purchase,
/// then already-enrolled, then duplicate-pending. No payment has occurred
/// when this returns; the caller redirects the user to the gateway.
pub async fn create_order(
    db: &DatabaseConnection,
    user_id: i32,
    target: OrderTarget,
) -> Result<orders::Model, DomainError> {
    let total_amount_cents = match target {
        OrderTarget::Course(course_id) => {
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

            let enrolled = Enrollments::find()
                .filter(enrollments::Column::UserId.eq(user_id))
                .filter(enrollments::Column::CourseId.eq(course_id))
                .filter(enrollments::Column::Status.ne(EnrollmentStatus::Dropped))
                .one(db)
                .await?;
            if enrolled.is_some() {
                return Err(DomainError::AlreadyEnrolled);
            }

            course.price_cents
        }
        OrderTarget::Path(path_id) => {
            let path = LearningPaths::find_by_id(path_id)
                .one(db)
                .await?
                .ok_or(DomainError::NotFound {
                    entity: "learning path",
                    id: path_id,
                })?;

            let enrolled = PathEnrollments::find()
                .filter(path_enrollments::Column::UserId.eq(user_id))
                .filter(path_enrollments::Column::PathId.eq(path_id))
                .filter(path_enrollments::Column::Status.ne(EnrollmentStatus::Dropped))
                .one(db)
                .await?;
            if enrolled.is_some() {
                return Err(DomainError::AlreadyEnrolled);
            }

            path.price_cents
        }
    };

    let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();

    // At most one live pending order per (user, target). An expired pending
    // order no longer blocks a new purchase.
    let mut pending = Orders::find()
        .filter(orders::Column::UserId.eq(user_id))
        .filter(orders::Column::Status.eq(OrderStatus::Pending))
        .filter(orders::Column::ExpiresAt.gt(now));
    pending = match target {
        OrderTarget::Course(course_id) => pending.filter(orders::Column::CourseId.eq(course_id)),
        OrderTarget::Path(path_id) => pending.filter(orders::Column::PathId.eq(path_id)),
    };
    if pending.one(db).await?.is_some() {
        return Err(DomainError::DuplicatePendingOrder);
    }

    let order = orders::ActiveModel {
        user_id: Set(user_id),
        course_id: Set(match target {
            OrderTarget::Course(course_id) => Some(course_id),
            OrderTarget::Path(_) => None,
        }),
        path_id: Set(match target {
            OrderTarget::Course(_) => None,
            OrderTarget::Path(path_id) => Some(path_id),
        }),
        total_amount_cents: Set(total_amount_cents),
        status: Set(OrderStatus::Pending),
        created_at: Set(now),
        expires_at: Set(now + Duration::minutes(ORDER_TTL_MINUTES)),
        ..Default::default()
    };
    let order = order.insert(db).await?;

    tracing::info!(
        "created pending order {} for user {} ({} cents)",
        order.id,
        user_id,
        total_amount_cents
    );
    Ok(order)
}

pub async fn get_order(db: &DatabaseConnection, order_id: i32) -> Result<orders::Model, DomainError> {
    Orders::find_by_id(order_id)
        .one(db)
        .await?
        .ok_or(DomainError::NotFound {
            entity: "order",
            id: order_id,
        })
}

pub async fn list_user_orders(
    db: &DatabaseConnection,
    user_id: i32,
) -> Result<Vec<orders::Model>, DomainError> {
    Ok(Orders::find()
        .filter(orders::Column::UserId.eq(user_id))
        .order_by_desc(orders::Column::CreatedAt)
        .all(db)
        .await?)
}
