use std::collections::HashSet;
use std::sync::Arc;

use lms_core::model::{Course, Enrollment, EnrollmentStatus, QuizAttempt, RatingSummary, User, UserId};
use lms_core::points::{NextBadge, next_badge};
use storage::repository::{
    AttemptRepository, CourseRepository, EnrollmentRepository, LessonRepository, QuizRepository,
    ReviewRepository, UserRepository,
};

use crate::error::DashboardError;

const RECENT_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone)]
pub struct EnrolledCourse {
    pub enrollment: Enrollment,
    pub course_title: String,
}

#[derive(Debug, Clone)]
pub struct LearnerDashboard {
    pub user: User,
    pub next_badge: Option<NextBadge>,
    pub enrollments: Vec<EnrolledCourse>,
    pub recent_attempts: Vec<QuizAttempt>,
}

#[derive(Debug, Clone)]
pub struct CourseStats {
    pub course: Course,
    pub enrolled: u32,
    pub completed: u32,
    pub lessons: u32,
    pub quizzes: u32,
    pub rating: RatingSummary,
}

#[derive(Debug, Clone)]
pub struct InstructorDashboard {
    pub courses: Vec<CourseStats>,
    /// Distinct learners across all of the instructor's courses.
    pub total_students: u32,
}

/// Read-only summaries assembled from several repositories.
#[derive(Clone)]
pub struct DashboardService {
    users: Arc<dyn UserRepository>,
    courses: Arc<dyn CourseRepository>,
    lessons: Arc<dyn LessonRepository>,
    quizzes: Arc<dyn QuizRepository>,
    enrollments: Arc<dyn EnrollmentRepository>,
    attempts: Arc<dyn AttemptRepository>,
    reviews: Arc<dyn ReviewRepository>,
}

impl DashboardService {
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        users: Arc<dyn UserRepository>,
        courses: Arc<dyn CourseRepository>,
        lessons: Arc<dyn LessonRepository>,
        quizzes: Arc<dyn QuizRepository>,
        enrollments: Arc<dyn EnrollmentRepository>,
        attempts: Arc<dyn AttemptRepository>,
        reviews: Arc<dyn ReviewRepository>,
    ) -> Self {
        Self {
            users,
            courses,
            lessons,
            quizzes,
            enrollments,
            attempts,
            reviews,
        }
    }

    /// # Errors
    ///
    /// Returns `DashboardError::UserNotFound` for unknown users.
    pub async fn learner(&self, user_id: UserId) -> Result<LearnerDashboard, DashboardError> {
        let user = self
            .users
            .get_user(user_id)
            .await?
            .ok_or(DashboardError::UserNotFound)?;

        let mut enrollments = Vec::new();
        for enrollment in self.enrollments.list_for_user(user_id).await? {
            // Enrollments cascade with their course, so a miss is a race with deletion.
            if let Some(course) = self.courses.get_course(enrollment.course_id()).await? {
                enrollments.push(EnrolledCourse {
                    enrollment,
                    course_title: course.title().to_owned(),
                });
            }
        }
        let recent_attempts = self.attempts.recent_attempts(user_id, RECENT_ATTEMPTS).await?;

        Ok(LearnerDashboard {
            next_badge: next_badge(user.points()),
            user,
            enrollments,
            recent_attempts,
        })
    }

    /// # Errors
    ///
    /// Returns `DashboardError::NotAnInstructor` for student accounts.
    pub async fn instructor(&self, actor: &User) -> Result<InstructorDashboard, DashboardError> {
        if !actor.role().can_author() {
            return Err(DashboardError::NotAnInstructor);
        }

        let mut students = HashSet::new();
        let mut courses = Vec::new();
        for course in self.courses.list_by_instructor(actor.id()).await? {
            let enrollments = self.enrollments.list_for_course(course.id()).await?;
            let completed = enrollments
                .iter()
                .filter(|e| e.status() == EnrollmentStatus::Completed)
                .count();
            students.extend(enrollments.iter().map(Enrollment::user_id));

            let lessons = self.lessons.list_lessons(course.id()).await?.len();
            let quizzes = self.quizzes.list_quizzes(course.id()).await?.len();
            let rating = RatingSummary::from_ratings(self.reviews.ratings(course.id()).await?);

            courses.push(CourseStats {
                course,
                enrolled: saturating_u32(enrollments.len()),
                completed: saturating_u32(completed),
                lessons: saturating_u32(lessons),
                quizzes: saturating_u32(quizzes),
                rating,
            });
        }

        Ok(InstructorDashboard {
            courses,
            total_students: saturating_u32(students.len()),
        })
    }
}

fn saturating_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}
