mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, PaginatorTrait, QueryFilter, Set,
};
use serde_json::json;

use coursehub_backend::entities::{courses, enrollments, orders, prelude::*, transactions};

use crate::common::*;

async fn create_course_order(
    app: &axum::Router,
    user_id: i32,
    course_id: i32,
) -> (StatusCode, serde_json::Value) {
    send_json(
        app,
        "POST",
        "/api/orders",
        Some(json!({ "userId": user_id, "targetType": "course", "targetId": course_id })),
    )
    .await
}

/// Order creation returns a pending order plus a signed gateway redirect
#[tokio::test]
async fn create_order_returns_pending_order_with_redirect() {
    let (app, _db) = test_app().await;
    let (course_id, _) = seed_course(&_db, 77, 4999, 2).await;

    let (status, body) = create_course_order(&app, 1, course_id).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["order"]["status"], "pending");
    assert_eq!(body["order"]["total_amount_cents"], 4999);
    assert_eq!(body["order"]["course_id"], course_id);
    assert!(body["order"]["path_id"].is_null());

    let redirect = body["redirectUrl"].as_str().unwrap();
    assert!(redirect.starts_with("https://pay.example.test/checkout?"));
    assert!(redirect.contains(&format!("orderId={}", body["order"]["id"])));
    assert!(redirect.contains("signature="));
}

/// At most one live pending order per (user, target)
#[tokio::test]
async fn duplicate_pending_order_is_rejected() {
    let (app, db) = test_app().await;
    let (course_id, _) = seed_course(&db, 77, 4999, 2).await;

    let (status, _) = create_course_order(&app, 1, course_id).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = create_course_order(&app, 1, course_id).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        body["error"],
        "You already have a pending order for this item"
    );

    // A different user is unaffected
    let (status, _) = create_course_order(&app, 2, course_id).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn instructor_cannot_purchase_own_course() {
    let (app, db) = test_app().await;
    let (course_id, _) = seed_course(&db, 77, 4999, 2).await;

    let (status, _) = create_course_order(&app, 77, course_id).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn unpublished_course_is_not_purchasable() {
    let (app, db) = test_app().await;
    let (course_id, _) = seed_course_with_status(
        &db,
        77,
        4999,
        2,
        courses::CourseStatus::Draft,
    )
    .await;

    let (status, _) = create_course_order(&app, 1, course_id).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn order_for_missing_course_is_not_found() {
    let (app, _db) = test_app().await;

    let (status, _) = create_course_order(&app, 1, 9999).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn already_enrolled_user_cannot_order_again() {
    let (app, db) = test_app().await;
    let (course_id, _) = seed_course(&db, 77, 4999, 2).await;

    enrollments::ActiveModel {
        user_id: Set(1),
        course_id: Set(course_id),
        status: Set(enrollments::EnrollmentStatus::Active),
        enrolled_at: Set(Utc::now().into()),
        ..Default::default()
    }
    .insert(&db)
    .await
    .unwrap();

    let (status, body) = create_course_order(&app, 1, course_id).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "You are already enrolled in this item");
}

/// A dropped enrollment does not block a repurchase; fulfillment revives the
/// existing row instead of leaving the paying user dropped
#[tokio::test]
async fn paid_order_reactivates_dropped_enrollment() {
    let (app, db) = test_app().await;
    let (course_id, _) = seed_course(&db, 77, 4999, 2).await;

    enrollments::ActiveModel {
        user_id: Set(1),
        course_id: Set(course_id),
        status: Set(enrollments::EnrollmentStatus::Dropped),
        enrolled_at: Set(Utc::now().into()),
        ..Default::default()
    }
    .insert(&db)
    .await
    .unwrap();

    let (status, body) = create_course_order(&app, 1, course_id).await;
    assert_eq!(status, StatusCode::CREATED);
    let order_id = body["order"]["id"].as_i64().unwrap() as i32;

    let uri = signed_callback_uri(&test_gateway(), order_id, "TX-100", "success");
    let (status, _) = send_json(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);

    let enrollment = Enrollments::find()
        .filter(enrollments::Column::UserId.eq(1))
        .filter(enrollments::Column::CourseId.eq(course_id))
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(enrollment.status, enrollments::EnrollmentStatus::Active);
    assert_eq!(Enrollments::find().count(&db).await.unwrap(), 1);
}

/// Confirmed payment atomically appends a transaction, completes the order
/// and creates the enrollment
#[tokio::test]
async fn confirmed_payment_fulfills_course_order() {
    let (app, db) = test_app().await;
    let (course_id, _) = seed_course(&db, 77, 4999, 2).await;

    let (_, body) = create_course_order(&app, 1, course_id).await;
    let order_id = body["order"]["id"].as_i64().unwrap() as i32;

    let uri = signed_callback_uri(&test_gateway(), order_id, "TX-100", "success");
    let (status, body) = send_json(&app, "GET", &uri, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "confirmed");

    let order = Orders::find_by_id(order_id).one(&db).await.unwrap().unwrap();
    assert_eq!(
        order.status,
        orders::OrderStatus::Completed
    );
    assert!(order.completed_at.is_some());

    let transaction_count = Transactions::find()
        .filter(transactions::Column::OrderId.eq(order_id))
        .count(&db)
        .await
        .unwrap();
    assert_eq!(transaction_count, 1);

    let enrollment_count = Enrollments::find()
        .filter(enrollments::Column::UserId.eq(1))
        .filter(enrollments::Column::CourseId.eq(course_id))
        .count(&db)
        .await
        .unwrap();
    assert_eq!(enrollment_count, 1);
}

/// Calling the confirmation twice produces exactly one transaction and one
/// enrollment; the order ends completed both times
#[tokio::test]
async fn payment_confirmation_is_idempotent() {
    let (app, db) = test_app().await;
    let (course_id, _) = seed_course(&db, 77, 4999, 2).await;

    let (_, body) = create_course_order(&app, 1, course_id).await;
    let order_id = body["order"]["id"].as_i64().unwrap() as i32;

    let uri = signed_callback_uri(&test_gateway(), order_id, "TX-100", "success");
    let (status, body) = send_json(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "confirmed");

    let (status, body) = send_json(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "alreadyCompleted");

    assert_eq!(
        Transactions::find()
            .filter(transactions::Column::OrderId.eq(order_id))
            .count(&db)
            .await
            .unwrap(),
        1
    );
    assert_eq!(
        Enrollments::find()
            .filter(enrollments::Column::UserId.eq(1))
            .count(&db)
            .await
            .unwrap(),
        1
    );
}

/// An invalid signature is a hard failure with no state change
#[tokio::test]
async fn callback_with_bad_signature_is_rejected() {
    let (app, db) = test_app().await;
    let (course_id, _) = seed_course(&db, 77, 4999, 2).await;

    let (_, body) = create_course_order(&app, 1, course_id).await;
    let order_id = body["order"]["id"].as_i64().unwrap() as i32;

    let uri = format!(
        "/api/payments/callback?orderId={}&reference=TX-1&status=success&signature=deadbeef",
        order_id
    );
    let (status, _) = send_json(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let order = Orders::find_by_id(order_id).one(&db).await.unwrap().unwrap();
    assert_eq!(
        order.status,
        orders::OrderStatus::Pending
    );
    assert_eq!(Enrollments::find().count(&db).await.unwrap(), 0);
}

/// A correctly signed failure report changes nothing
#[tokio::test]
async fn failed_payment_leaves_order_pending() {
    let (app, db) = test_app().await;
    let (course_id, _) = seed_course(&db, 77, 4999, 2).await;

    let (_, body) = create_course_order(&app, 1, course_id).await;
    let order_id = body["order"]["id"].as_i64().unwrap() as i32;

    let uri = signed_callback_uri(&test_gateway(), order_id, "TX-100", "failed");
    let (status, body) = send_json(&app, "GET", &uri, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "failed");

    let order = Orders::find_by_id(order_id).one(&db).await.unwrap().unwrap();
    assert_eq!(
        order.status,
        orders::OrderStatus::Pending
    );
    assert_eq!(Transactions::find().count(&db).await.unwrap(), 0);
}

/// Confirmation past expires_at is rejected without side effects
#[tokio::test]
async fn expired_order_cannot_be_confirmed() {
    let (app, db) = test_app().await;
    let (course_id, _) = seed_course(&db, 77, 4999, 2).await;

    let (_, body) = create_course_order(&app, 1, course_id).await;
    let order_id = body["order"]["id"].as_i64().unwrap() as i32;

    // Backdate the expiry
    let order = Orders::find_by_id(order_id).one(&db).await.unwrap().unwrap();
    let mut active = order.into_active_model();
    active.expires_at = Set((Utc::now() - Duration::hours(1)).into());
    active.update(&db).await.unwrap();

    let uri = signed_callback_uri(&test_gateway(), order_id, "TX-100", "success");
    let (status, body) = send_json(&app, "GET", &uri, None).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "This order has expired; please place a new one");

    let order = Orders::find_by_id(order_id).one(&db).await.unwrap().unwrap();
    assert_eq!(
        order.status,
        orders::OrderStatus::Pending
    );
    assert_eq!(Transactions::find().count(&db).await.unwrap(), 0);
    assert_eq!(Enrollments::find().count(&db).await.unwrap(), 0);
}

/// An expired pending order no longer blocks a fresh purchase
#[tokio::test]
async fn expired_pending_order_does_not_block_reorder() {
    let (app, db) = test_app().await;
    let (course_id, _) = seed_course(&db, 77, 4999, 2).await;

    let (_, body) = create_course_order(&app, 1, course_id).await;
    let order_id = body["order"]["id"].as_i64().unwrap() as i32;

    let order = Orders::find_by_id(order_id).one(&db).await.unwrap().unwrap();
    let mut active = order.into_active_model();
    active.expires_at = Set((Utc::now() - Duration::hours(1)).into());
    active.update(&db).await.unwrap();

    let (status, _) = create_course_order(&app, 1, course_id).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn user_orders_are_listed_newest_first() {
    let (app, db) = test_app().await;
    let (course_a, _) = seed_course(&db, 77, 1000, 1).await;
    let (course_b, _) = seed_course(&db, 78, 2000, 1).await;

    create_course_order(&app, 1, course_a).await;
    create_course_order(&app, 1, course_b).await;

    let (status, body) = send_json(&app, "GET", "/api/users/1/orders", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
}
