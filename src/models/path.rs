use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathCourseView {
    pub course_id: i32,
    pub title: String,
    pub order_index: i32,
    pub is_completed: bool,
    pub is_current: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathViewResponse {
    pub path_id: i32,
    pub title: String,
    /// The user has no path enrollment at all; courses are not individually
    /// locked by prerequisite
    pub is_locked: bool,
    pub progress_percentage: i32,
    pub courses: Vec<PathCourseView>,
}
