mod common;

use axum::http::StatusCode;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, PaginatorTrait, QueryFilter, Set,
};
use serde_json::json;

use coursehub_backend::entities::{enrollments, path_enrollments, prelude::*};

use crate::common::*;

/// Three one-lesson courses bundled in a path; returns (path_id, course_ids,
/// lesson_ids in path order)
async fn seed_three_course_path(db: &sea_orm::DatabaseConnection) -> (i32, Vec<i32>, Vec<i32>) {
    let mut course_ids = Vec::new();
    let mut lesson_ids = Vec::new();
    for instructor in [71, 72, 73] {
        let (course_id, lessons) = seed_course(db, instructor, 2500, 1).await;
        course_ids.push(course_id);
        lesson_ids.push(lessons[0]);
    }
    let path_id = seed_path(db, 5999, &course_ids).await;
    (path_id, course_ids, lesson_ids)
}

/// Place a path order for the user and confirm it through the callback
async fn purchase_path(app: &axum::Router, user_id: i32, path_id: i32) {
    let (status, body) = send_json(
        app,
        "POST",
        "/api/orders",
        Some(json!({ "userId": user_id, "targetType": "path", "targetId": path_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let order_id = body["order"]["id"].as_i64().unwrap() as i32;

    let uri = signed_callback_uri(&test_gateway(), order_id, "TX-PATH", "success");
    let (status, body) = send_json(app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "confirmed");
}

/// A confirmed path order expands into one path enrollment plus a course
/// enrollment per member
#[tokio::test]
async fn path_purchase_enrolls_into_every_course() {
    let (app, db) = test_app().await;
    let (path_id, course_ids, _) = seed_three_course_path(&db).await;

    purchase_path(&app, 1, path_id).await;

    let path_enrollment = PathEnrollments::find()
        .filter(path_enrollments::Column::UserId.eq(1))
        .filter(path_enrollments::Column::PathId.eq(path_id))
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(path_enrollment.status, enrollments::EnrollmentStatus::Active);
    assert_eq!(path_enrollment.progress_percentage, 0);

    let enrollment_count = Enrollments::find()
        .filter(enrollments::Column::UserId.eq(1))
        .count(&db)
        .await
        .unwrap();
    assert_eq!(enrollment_count, course_ids.len() as u64);
}

/// A course the user already holds is skipped during expansion rather than
/// duplicated
#[tokio::test]
async fn path_expansion_skips_existing_enrollments() {
    let (app, db) = test_app().await;
    let (path_id, course_ids, _) = seed_three_course_path(&db).await;

    enrollments::ActiveModel {
        user_id: Set(1),
        course_id: Set(course_ids[1]),
        status: Set(enrollments::EnrollmentStatus::Active),
        enrolled_at: Set(Utc::now().into()),
        ..Default::default()
    }
    .insert(&db)
    .await
    .unwrap();

    purchase_path(&app, 1, path_id).await;

    assert_eq!(
        Enrollments::find()
            .filter(enrollments::Column::UserId.eq(1))
            .count(&db)
            .await
            .unwrap(),
        3
    );
    assert_eq!(
        Enrollments::find()
            .filter(enrollments::Column::UserId.eq(1))
            .filter(enrollments::Column::CourseId.eq(course_ids[1]))
            .count(&db)
            .await
            .unwrap(),
        1
    );
}

#[tokio::test]
async fn path_view_is_locked_without_enrollment() {
    let (app, db) = test_app().await;
    let (path_id, _, _) = seed_three_course_path(&db).await;

    let (status, body) =
        send_json(&app, "GET", &format!("/api/users/1/paths/{}", path_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isLocked"], true);
    assert_eq!(body["progressPercentage"], 0);
    assert_eq!(body["courses"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn path_view_for_unknown_path_is_not_found() {
    let (app, _db) = test_app().await;

    let (status, _) = send_json(&app, "GET", "/api/users/1/paths/9999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

/// The first unfinished course after the completed prefix is marked current
#[tokio::test]
async fn path_view_advances_current_past_completed_prefix() {
    let (app, db) = test_app().await;
    let (path_id, course_ids, _) = seed_three_course_path(&db).await;

    purchase_path(&app, 1, path_id).await;

    // Fresh path: first course is current
    let (_, body) =
        send_json(&app, "GET", &format!("/api/users/1/paths/{}", path_id), None).await;
    assert_eq!(body["isLocked"], false);
    let courses = body["courses"].as_array().unwrap();
    assert_eq!(courses[0]["isCurrent"], true);
    assert_eq!(courses[1]["isCurrent"], false);

    // Finish the first course directly
    let first = Enrollments::find()
        .filter(enrollments::Column::UserId.eq(1))
        .filter(enrollments::Column::CourseId.eq(course_ids[0]))
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    let mut active = first.into_active_model();
    active.status = Set(enrollments::EnrollmentStatus::Completed);
    active.completed_at = Set(Some(Utc::now().into()));
    active.update(&db).await.unwrap();

    let (_, body) =
        send_json(&app, "GET", &format!("/api/users/1/paths/{}", path_id), None).await;
    let courses = body["courses"].as_array().unwrap();
    assert_eq!(courses[0]["isCompleted"], true);
    assert_eq!(courses[0]["isCurrent"], false);
    assert_eq!(courses[1]["isCompleted"], false);
    assert_eq!(courses[1]["isCurrent"], true);
    assert_eq!(courses[2]["isCurrent"], false);
    assert_eq!(body["progressPercentage"], 33);
}

/// Finishing member courses through the lesson pipeline rolls the percentage
/// up to the path enrollment and completes it at 100
#[tokio::test]
async fn path_progress_rolls_up_from_course_completion() {
    let (app, db) = test_app().await;
    let (path_id, course_ids, lesson_ids) = seed_three_course_path(&db).await;

    purchase_path(&app, 1, path_id).await;

    let enrollment_for = |course_id: i32| {
        let db = db.clone();
        async move {
            Enrollments::find()
                .filter(enrollments::Column::UserId.eq(1))
                .filter(enrollments::Column::CourseId.eq(course_id))
                .one(&db)
                .await
                .unwrap()
                .unwrap()
        }
    };

    // Each course has a single lesson, so one completion finishes it
    for (i, (course_id, lesson_id)) in course_ids.iter().zip(&lesson_ids).enumerate() {
        let enrollment = enrollment_for(*course_id).await;
        let (status, body) = send_json(
            &app,
            "POST",
            &format!("/api/enrollments/{}/lessons/{}/complete", enrollment.id, lesson_id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["courseCompleted"], true);

        let path_enrollment = PathEnrollments::find()
            .filter(path_enrollments::Column::UserId.eq(1))
            .filter(path_enrollments::Column::PathId.eq(path_id))
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        let expected_pct = ((i + 1) * 100 / 3) as i32;
        assert_eq!(path_enrollment.progress_percentage, expected_pct);
        if i + 1 == course_ids.len() {
            assert_eq!(
                path_enrollment.status,
                enrollments::EnrollmentStatus::Completed
            );
            assert!(path_enrollment.completed_at.is_some());
        } else {
            assert_eq!(path_enrollment.status, enrollments::EnrollmentStatus::Active);
        }
    }

    // One certificate per member course
    assert_eq!(Certificates::find().count(&db).await.unwrap(), 3);
}
