use serde::{Deserialize, Serialize};

use crate::entities::{enrollments, lesson_progress};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollFreeRequest {
    pub user_id: i32,
    pub course_id: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentProgressResponse {
    pub enrollment: enrollments::Model,
    pub course_title: String,
    pub total_lessons: u64,
    pub completed_lessons: u64,
    pub progress_percentage: i32,
    pub lessons: Vec<lesson_progress::Model>,
}
