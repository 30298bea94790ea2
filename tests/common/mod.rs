#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, DbErr, Set,
    prelude::DateTimeWithTimeZone,
};
use serde_json::Value;
use std::env;
use tower::ServiceExt;

use coursehub_backend::AppState;
use coursehub_backend::entities::courses::CourseStatus;
use coursehub_backend::entities::{course_modules, courses, learning_paths, lessons, path_courses, quiz_attempts, quizzes};
use coursehub_backend::router::api_router;
use coursehub_backend::services::notifications::NotificationService;
use coursehub_backend::services::payments::PaymentGatewayService;

use migration::{Migrator, MigratorTrait};

pub const TEST_GATEWAY_SECRET: &str = "gw_test123secret456";

/// Set up a migrated test database connection.
/// Uses TEST_DATABASE_URL or falls back to an in-memory sqlite database.
pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    let database_url =
        env::var("TEST_DATABASE_URL").unwrap_or_else(|_| "sqlite::memory:".to_string());

    let mut options = ConnectOptions::new(database_url.clone());
    if database_url.starts_with("sqlite") {
        // a pooled second connection would see a different in-memory database
        options.max_connections(1);
    }

    let db = Database::connect(options).await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

pub fn test_gateway() -> PaymentGatewayService {
    PaymentGatewayService::new(
        "https://pay.example.test".to_string(),
        "http://localhost:3000/api/payments/callback".to_string(),
        TEST_GATEWAY_SECRET.to_string(),
    )
}

pub fn test_state(db: DatabaseConnection) -> AppState {
    AppState {
        db,
        gateway: test_gateway(),
        notifier: NotificationService::new(None),
    }
}

/// Migrated database + full router over it
pub async fn test_app() -> (axum::Router, DatabaseConnection) {
    let db = setup_test_db().await.expect("Failed to set up test DB");
    let app = api_router(test_state(db.clone()));
    (app, db)
}

/// Drive one request through the router; returns status + parsed JSON body
pub async fn send_json(
    app: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

/// Published course with one module and `lesson_count` lessons
pub async fn seed_course(
    db: &DatabaseConnection,
    instructor_id: i32,
    price_cents: i64,
    lesson_count: usize,
) -> (i32, Vec<i32>) {
    seed_course_with_status(db, instructor_id, price_cents, lesson_count, CourseStatus::Published)
        .await
}

pub async fn seed_course_with_status(
    db: &DatabaseConnection,
    instructor_id: i32,
    price_cents: i64,
    lesson_count: usize,
    status: CourseStatus,
) -> (i32, Vec<i32>) {
    let now: DateTimeWithTimeZone = Utc::now().into();

    let course = courses::ActiveModel {
        title: Set(format!("Course by instructor {}", instructor_id)),
        instructor_id: Set(instructor_id),
        price_cents: Set(price_cents),
        status: Set(status),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap();

    let module = course_modules::ActiveModel {
        course_id: Set(course.id),
        title: Set("Module 1".to_string()),
        order_index: Set(0),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap();

    let mut lesson_ids = Vec::with_capacity(lesson_count);
    for i in 0..lesson_count {
        let lesson = lessons::ActiveModel {
            module_id: Set(module.id),
            title: Set(format!("Lesson {}", i + 1)),
            order_index: Set(i as i32),
            duration_secs: Set(Some(300)),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap();
        lesson_ids.push(lesson.id);
    }

    (course.id, lesson_ids)
}

/// Learning path bundling the given courses in order
pub async fn seed_path(db: &DatabaseConnection, price_cents: i64, course_ids: &[i32]) -> i32 {
    let now: DateTimeWithTimeZone = Utc::now().into();

    let path = learning_paths::ActiveModel {
        title: Set("Test learning path".to_string()),
        price_cents: Set(price_cents),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap();

    for (i, course_id) in course_ids.iter().enumerate() {
        path_courses::ActiveModel {
            path_id: Set(path.id),
            course_id: Set(*course_id),
            order_index: Set(i as i32),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap();
    }

    path.id
}

pub async fn seed_quiz(db: &DatabaseConnection, lesson_id: i32, passing_score: i32) -> i32 {
    let quiz = quizzes::ActiveModel {
        lesson_id: Set(lesson_id),
        title: Set("Checkpoint quiz".to_string()),
        passing_score: Set(passing_score),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap();
    quiz.id
}

pub async fn seed_quiz_attempt(
    db: &DatabaseConnection,
    quiz_id: i32,
    user_id: i32,
    score: i32,
    passed: bool,
) {
    quiz_attempts::ActiveModel {
        quiz_id: Set(quiz_id),
        user_id: Set(user_id),
        score: Set(score),
        passed: Set(passed),
        attempted_at: Set(Utc::now().into()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap();
}

/// Callback URI signed the way the gateway would sign it
pub fn signed_callback_uri(
    gateway: &PaymentGatewayService,
    order_id: i32,
    reference: &str,
    status: &str,
) -> String {
    let order_id_s = order_id.to_string();
    let pairs = [
        ("orderId", order_id_s.as_str()),
        ("reference", reference),
        ("status", status),
    ];
    let signature = gateway.sign(&pairs);
    format!(
        "/api/payments/callback?orderId={}&reference={}&status={}&signature={}",
        order_id, reference, status, signature
    )
}
