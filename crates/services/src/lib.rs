#![forbid(unsafe_code)]

mod access;
pub mod app_services;
pub mod course_service;
pub mod dashboard_service;
pub mod enrollment_service;
pub mod error;
pub mod lesson_service;
pub mod progress_service;
pub mod quiz_service;
pub mod review_service;
pub mod user_service;

pub use lms_core::Clock;

pub use app_services::AppServices;
pub use course_service::{CourseOutline, CourseService};
pub use dashboard_service::{
    CourseStats, DashboardService, EnrolledCourse, InstructorDashboard, LearnerDashboard,
};
pub use enrollment_service::{CourseProgress, EnrollmentService, LessonCompletion};
pub use error::{
    AppServicesError, CourseServiceError, DashboardError, EnrollmentServiceError, ProgressError,
    QuizServiceError, ReviewServiceError, UserServiceError,
};
pub use lesson_service::LessonService;
pub use progress_service::ProgressService;
pub use quiz_service::{AttemptOutcome, QuizService, QuizView};
pub use review_service::ReviewService;
pub use user_service::UserService;
