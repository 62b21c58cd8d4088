//! Wire shapes. Everything is camelCase on the wire.

use chrono::{DateTime, Utc};
use lms_core::model::{
    AttemptId, Course, CourseId, CourseLevel, CourseReview, Enrollment, EnrollmentStatus, Lesson,
    LessonId, LessonProgress, PointEvent, Quiz, QuizAttempt, QuizId, RatingSummary, ReviewId,
    Role, User, UserId,
};
use lms_core::points::{Badge, NextBadge};
use serde::Serialize;
use services::{
    AttemptOutcome, CourseOutline, CourseProgress, CourseStats, EnrolledCourse,
    InstructorDashboard, LearnerDashboard, LessonCompletion,
};

//
// ─── USERS ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub points: u32,
    pub badge: Badge,
    pub badge_label: &'static str,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserDto {
    fn from(user: &User) -> Self {
        Self {
            id: user.id(),
            name: user.name().to_owned(),
            email: user.email().to_owned(),
            role: user.role(),
            points: user.points(),
            badge: user.badge(),
            badge_label: user.badge().label(),
            created_at: user.created_at(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntryDto {
    pub rank: usize,
    pub user_id: UserId,
    pub name: String,
    pub points: u32,
    pub badge: Badge,
}

impl LeaderboardEntryDto {
    pub fn ranked(users: &[User]) -> Vec<Self> {
        users
            .iter()
            .enumerate()
            .map(|(index, user)| Self {
                rank: index + 1,
                user_id: user.id(),
                name: user.name().to_owned(),
                points: user.points(),
                badge: user.badge(),
            })
            .collect()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointEventDto {
    pub amount: u32,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

impl From<&PointEvent> for PointEventDto {
    fn from(event: &PointEvent) -> Self {
        Self {
            amount: event.amount,
            reason: event.reason.clone(),
            created_at: event.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NextBadgeDto {
    pub badge: Badge,
    pub label: &'static str,
    pub points_needed: u32,
}

impl From<NextBadge> for NextBadgeDto {
    fn from(next: NextBadge) -> Self {
        Self {
            badge: next.badge,
            label: next.badge.label(),
            points_needed: next.points_needed,
        }
    }
}

//
// ─── COURSES & LESSONS ─────────────────────────────────────────────────────────
//

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseDto {
    pub id: CourseId,
    pub instructor_id: UserId,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub level: CourseLevel,
    pub thumbnail_url: Option<String>,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Course> for CourseDto {
    fn from(course: &Course) -> Self {
        let details = course.details();
        Self {
            id: course.id(),
            instructor_id: course.instructor_id(),
            title: details.title().to_owned(),
            description: details.description().map(str::to_owned),
            category: details.category().map(str::to_owned),
            level: details.level(),
            thumbnail_url: details.thumbnail().map(|url| url.as_str().to_owned()),
            published: course.is_published(),
            created_at: course.created_at(),
            updated_at: course.updated_at(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonDto {
    pub id: LessonId,
    pub course_id: CourseId,
    pub title: String,
    pub content: String,
    pub video_url: Option<String>,
    pub duration_minutes: u32,
    pub position: u32,
    pub created_at: DateTime<Utc>,
}

impl From<&Lesson> for LessonDto {
    fn from(lesson: &Lesson) -> Self {
        let details = lesson.details();
        Self {
            id: lesson.id(),
            course_id: lesson.course_id(),
            title: details.title().to_owned(),
            content: details.content().to_owned(),
            video_url: details.video().map(|url| url.as_str().to_owned()),
            duration_minutes: details.duration_minutes(),
            position: lesson.position(),
            created_at: lesson.created_at(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseOutlineDto {
    pub course: CourseDto,
    pub lessons: Vec<LessonDto>,
    pub quizzes: Vec<QuizDto>,
}

impl From<&CourseOutline> for CourseOutlineDto {
    fn from(outline: &CourseOutline) -> Self {
        Self {
            course: (&outline.course).into(),
            lessons: outline.lessons.iter().map(LessonDto::from).collect(),
            quizzes: outline
                .quizzes
                .iter()
                .map(|quiz| QuizDto::new(quiz, outline.reveal_answers))
                .collect(),
        }
    }
}

//
// ─── QUIZZES ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDto {
    pub prompt: String,
    pub options: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_option: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizDto {
    pub id: QuizId,
    pub course_id: CourseId,
    pub lesson_id: Option<LessonId>,
    pub title: String,
    pub passing_percent: u8,
    pub max_attempts: Option<u32>,
    pub questions: Vec<QuestionDto>,
    pub created_at: DateTime<Utc>,
}

impl QuizDto {
    /// Correct options are only included when `reveal_answers` is set.
    pub fn new(quiz: &Quiz, reveal_answers: bool) -> Self {
        Self {
            id: quiz.id(),
            course_id: quiz.course_id(),
            lesson_id: quiz.lesson_id(),
            title: quiz.title().to_owned(),
            passing_percent: quiz.passing_percent(),
            max_attempts: quiz.max_attempts(),
            questions: quiz
                .questions()
                .iter()
                .map(|question| QuestionDto {
                    prompt: question.prompt.clone(),
                    options: question.options.clone(),
                    correct_option: reveal_answers.then_some(question.correct_option),
                })
                .collect(),
            created_at: quiz.created_at(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptDto {
    pub id: AttemptId,
    pub quiz_id: QuizId,
    pub attempt_number: u32,
    pub correct: u32,
    pub total: u32,
    pub percentage: u8,
    pub passed: bool,
    pub answers: Vec<Option<usize>>,
    pub points_awarded: u32,
    pub submitted_at: DateTime<Utc>,
}

impl From<&QuizAttempt> for AttemptDto {
    fn from(attempt: &QuizAttempt) -> Self {
        Self {
            id: attempt.id,
            quiz_id: attempt.quiz_id,
            attempt_number: attempt.attempt_number,
            correct: attempt.score.correct,
            total: attempt.score.total,
            percentage: attempt.score.percentage,
            passed: attempt.score.passed,
            answers: attempt.answers.clone(),
            points_awarded: attempt.points_awarded,
            submitted_at: attempt.submitted_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptOutcomeDto {
    pub attempt: AttemptDto,
    pub total_points: u32,
    pub badge: Badge,
    pub badge_changed: bool,
    pub enrollment: Option<EnrollmentDto>,
}

impl From<&AttemptOutcome> for AttemptOutcomeDto {
    fn from(outcome: &AttemptOutcome) -> Self {
        Self {
            attempt: (&outcome.attempt).into(),
            total_points: outcome.total_points,
            badge: outcome.badge,
            badge_changed: outcome.badge_changed,
            enrollment: outcome.enrollment.as_ref().map(EnrollmentDto::from),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptHistoryDto {
    pub attempts: Vec<AttemptDto>,
    pub best_attempt_id: Option<AttemptId>,
}

//
// ─── ENROLLMENT & PROGRESS ─────────────────────────────────────────────────────
//

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentDto {
    pub user_id: UserId,
    pub course_id: CourseId,
    pub status: EnrollmentStatus,
    pub progress_percent: u8,
    pub enrolled_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<&Enrollment> for EnrollmentDto {
    fn from(enrollment: &Enrollment) -> Self {
        Self {
            user_id: enrollment.user_id(),
            course_id: enrollment.course_id(),
            status: enrollment.status(),
            progress_percent: enrollment.progress_percent(),
            enrolled_at: enrollment.enrolled_at(),
            completed_at: enrollment.completed_at(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonProgressDto {
    pub lesson_id: LessonId,
    pub completed: bool,
    pub time_spent_secs: u64,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl From<&LessonProgress> for LessonProgressDto {
    fn from(progress: &LessonProgress) -> Self {
        Self {
            lesson_id: progress.lesson_id,
            completed: progress.completed,
            time_spent_secs: progress.time_spent_secs,
            completed_at: progress.completed_at,
            updated_at: progress.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonCompletionDto {
    pub progress: LessonProgressDto,
    pub enrollment: EnrollmentDto,
}

impl From<&LessonCompletion> for LessonCompletionDto {
    fn from(completion: &LessonCompletion) -> Self {
        Self {
            progress: (&completion.progress).into(),
            enrollment: (&completion.enrollment).into(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseProgressDto {
    pub enrollment: EnrollmentDto,
    pub total_lessons: u32,
    pub completed_lessons: u32,
    pub total_quizzes: u32,
    pub attempted_quizzes: u32,
    pub lessons: Vec<LessonProgressDto>,
}

impl From<&CourseProgress> for CourseProgressDto {
    fn from(progress: &CourseProgress) -> Self {
        Self {
            enrollment: (&progress.enrollment).into(),
            total_lessons: progress.counts.total_lessons,
            completed_lessons: progress.counts.completed_lessons,
            total_quizzes: progress.counts.total_quizzes,
            attempted_quizzes: progress.counts.attempted_quizzes,
            lessons: progress.lessons.iter().map(LessonProgressDto::from).collect(),
        }
    }
}

//
// ─── REVIEWS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewDto {
    pub id: ReviewId,
    pub user_id: UserId,
    pub course_id: CourseId,
    pub rating: u8,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&CourseReview> for ReviewDto {
    fn from(review: &CourseReview) -> Self {
        Self {
            id: review.id,
            user_id: review.user_id,
            course_id: review.course_id,
            rating: review.rating.value(),
            comment: review.comment.clone(),
            created_at: review.created_at,
            updated_at: review.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingSummaryDto {
    pub count: u32,
    pub average: f64,
    pub histogram: [u32; 5],
}

impl From<&RatingSummary> for RatingSummaryDto {
    fn from(summary: &RatingSummary) -> Self {
        Self {
            count: summary.count,
            average: summary.average,
            histogram: summary.histogram,
        }
    }
}

//
// ─── DASHBOARDS ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrolledCourseDto {
    pub course_title: String,
    #[serde(flatten)]
    pub enrollment: EnrollmentDto,
}

impl From<&EnrolledCourse> for EnrolledCourseDto {
    fn from(entry: &EnrolledCourse) -> Self {
        Self {
            course_title: entry.course_title.clone(),
            enrollment: (&entry.enrollment).into(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnerDashboardDto {
    pub user: UserDto,
    pub next_badge: Option<NextBadgeDto>,
    pub enrollments: Vec<EnrolledCourseDto>,
    pub recent_attempts: Vec<AttemptDto>,
}

impl From<&LearnerDashboard> for LearnerDashboardDto {
    fn from(dashboard: &LearnerDashboard) -> Self {
        Self {
            user: (&dashboard.user).into(),
            next_badge: dashboard.next_badge.map(NextBadgeDto::from),
            enrollments: dashboard
                .enrollments
                .iter()
                .map(EnrolledCourseDto::from)
                .collect(),
            recent_attempts: dashboard
                .recent_attempts
                .iter()
                .map(AttemptDto::from)
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseStatsDto {
    pub course: CourseDto,
    pub enrolled: u32,
    pub completed: u32,
    pub lessons: u32,
    pub quizzes: u32,
    pub rating: RatingSummaryDto,
}

impl From<&CourseStats> for CourseStatsDto {
    fn from(stats: &CourseStats) -> Self {
        Self {
            course: (&stats.course).into(),
            enrolled: stats.enrolled,
            completed: stats.completed,
            lessons: stats.lessons,
            quizzes: stats.quizzes,
            rating: (&stats.rating).into(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstructorDashboardDto {
    pub courses: Vec<CourseStatsDto>,
    pub total_students: u32,
}

impl From<&InstructorDashboard> for InstructorDashboardDto {
    fn from(dashboard: &InstructorDashboard) -> Self {
        Self {
            courses: dashboard.courses.iter().map(CourseStatsDto::from).collect(),
            total_students: dashboard.total_students,
        }
    }
}
