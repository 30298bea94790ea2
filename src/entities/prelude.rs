pub use super::certificates::Entity as Certificates;
pub use super::course_modules::Entity as CourseModules;
pub use super::courses::Entity as Courses;
pub use super::enrollments::Entity as Enrollments;
pub use super::learning_paths::Entity as LearningPaths;
pub use super::lesson_progress::Entity as LessonProgress;
pub use super::lessons::Entity as Lessons;
pub use super::orders::Entity as Orders;
pub use super::path_courses::Entity as PathCourses;
pub use super::path_enrollments::Entity as PathEnrollments;
pub use super::quiz_attempts::Entity as QuizAttempts;
pub use super::quizzes::Entity as Quizzes;
pub use super::transactions::Entity as Transactions;
