use serde::{Deserialize, Serialize};

use crate::entities::certificates;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchPositionRequest {
    pub position: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteLessonResponse {
    pub progress_percentage: i32,
    pub course_completed: bool,
    pub certificate: Option<certificates::Model>,
}
