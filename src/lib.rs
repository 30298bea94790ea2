// src/lib.rs

use sea_orm::DatabaseConnection;
use services::{notifications::NotificationService, payments::PaymentGatewayService};

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub gateway: PaymentGatewayService,
    pub notifier: NotificationService,
}

pub mod entities {
    pub mod prelude;

    pub mod certificates;
    pub mod course_modules;
    pub mod courses;
    pub mod enrollments;
    pub mod learning_paths;
    pub mod lesson_progress;
    pub mod lessons;
    pub mod orders;
    pub mod path_courses;
    pub mod path_enrollments;
    pub mod quiz_attempts;
    pub mod quizzes;
    pub mod transactions;
}

pub mod services {
    pub mod certificates;
    pub mod error;
    pub mod fulfillment;
    pub mod notifications;
    pub mod orders;
    pub mod path_view;
    pub mod payments;
    pub mod progress;
    pub mod quiz_gate;
}

pub mod models;
pub mod handlers;
pub mod router;
