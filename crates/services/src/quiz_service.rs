use std::sync::Arc;

use lms_core::model::{
    CourseId, Enrollment, Lesson, Quiz, QuizAttempt, QuizDraft, QuizId, User, UserId,
};
use lms_core::points::{Badge, points_for};
use lms_core::scoring::grade;
use storage::repository::{
    AttemptRepository, CourseRepository, EnrollmentRepository, LessonRepository,
    NewAttemptRecord, QuizRepository, StorageError,
};
use tracing::{info, warn};

use crate::Clock;
use crate::access::{can_manage, can_view};
use crate::error::QuizServiceError;
use crate::progress_service::ProgressService;

/// A quiz as seen by one viewer.
#[derive(Debug, Clone)]
pub struct QuizView {
    pub quiz: Quiz,
    /// Only course managers see which option is correct.
    pub reveal_answers: bool,
}

/// What a learner gets back after submitting a quiz.
#[derive(Debug, Clone)]
pub struct AttemptOutcome {
    pub attempt: QuizAttempt,
    pub total_points: u32,
    pub badge: Badge,
    pub badge_changed: bool,
    /// The enrollment after progress was recomputed.
    pub enrollment: Option<Enrollment>,
}

#[derive(Clone)]
pub struct QuizService {
    clock: Clock,
    courses: Arc<dyn CourseRepository>,
    lessons: Arc<dyn LessonRepository>,
    quizzes: Arc<dyn QuizRepository>,
    enrollments: Arc<dyn EnrollmentRepository>,
    attempts: Arc<dyn AttemptRepository>,
    progress: Arc<ProgressService>,
}

impl QuizService {
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        clock: Clock,
        courses: Arc<dyn CourseRepository>,
        lessons: Arc<dyn LessonRepository>,
        quizzes: Arc<dyn QuizRepository>,
        enrollments: Arc<dyn EnrollmentRepository>,
        attempts: Arc<dyn AttemptRepository>,
        progress: Arc<ProgressService>,
    ) -> Self {
        Self {
            clock,
            courses,
            lessons,
            quizzes,
            enrollments,
            attempts,
            progress,
        }
    }

    //
    // ─── AUTHORING ─────────────────────────────────────────────────────────────
    //

    /// Validate and store a quiz, then recompute progress for the course.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::CourseNotFound`, `QuizServiceError::Forbidden`,
    /// or `QuizServiceError::Quiz` for invalid drafts.
    pub async fn create_quiz(
        &self,
        actor: &User,
        course_id: CourseId,
        draft: QuizDraft,
    ) -> Result<Quiz, QuizServiceError> {
        self.authorize(actor, course_id).await?;
        let lesson_ids: Vec<_> = self
            .lessons
            .list_lessons(course_id)
            .await?
            .iter()
            .map(Lesson::id)
            .collect();
        let quiz = draft.validate(QuizId::new(0), course_id, &lesson_ids, self.clock.now())?;
        let id = self.quizzes.insert_quiz(&quiz).await?;
        info!(course_id = %course_id, quiz_id = %id, questions = quiz.questions().len(), "quiz created");

        self.progress.recompute_course(course_id).await?;
        Ok(quiz.with_id(id))
    }

    /// Delete a quiz together with its attempts.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::NotFound` or `QuizServiceError::Forbidden`.
    pub async fn delete_quiz(&self, actor: &User, id: QuizId) -> Result<(), QuizServiceError> {
        let quiz = self.require_quiz(id).await?;
        self.authorize(actor, quiz.course_id()).await?;
        match self.quizzes.delete_quiz(id).await {
            Ok(()) => {}
            Err(StorageError::NotFound) => return Err(QuizServiceError::NotFound),
            Err(e) => return Err(e.into()),
        }
        info!(course_id = %quiz.course_id(), quiz_id = %id, "quiz deleted");

        self.progress.recompute_course(quiz.course_id()).await?;
        Ok(())
    }

    /// Fetch a quiz for `viewer`, deciding whether answers may be shown.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::NotFound` for missing quizzes or hidden courses.
    pub async fn get_quiz(&self, viewer: &User, id: QuizId) -> Result<QuizView, QuizServiceError> {
        let quiz = self.require_quiz(id).await?;
        let course = self
            .courses
            .get_course(quiz.course_id())
            .await?
            .ok_or(QuizServiceError::NotFound)?;
        if !can_view(Some(viewer), &course) {
            return Err(QuizServiceError::NotFound);
        }
        Ok(QuizView {
            reveal_answers: can_manage(viewer, &course),
            quiz,
        })
    }

    /// # Errors
    ///
    /// Returns `QuizServiceError::Storage` if repository access fails.
    pub async fn list_quizzes(&self, course_id: CourseId) -> Result<Vec<Quiz>, QuizServiceError> {
        Ok(self.quizzes.list_quizzes(course_id).await?)
    }

    //
    // ─── ATTEMPTS ──────────────────────────────────────────────────────────────
    //

    /// Grade a submission, store it, award points and update progress.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::NotEnrolled` if the learner is not in the
    /// quiz's course, `QuizServiceError::AttemptsExhausted` once the limit is
    /// reached, and `QuizServiceError::Submission` for malformed answers.
    pub async fn submit_attempt(
        &self,
        actor: &User,
        quiz_id: QuizId,
        answers: Vec<Option<usize>>,
    ) -> Result<AttemptOutcome, QuizServiceError> {
        let quiz = self.require_quiz(quiz_id).await?;
        let course_id = quiz.course_id();
        if self
            .enrollments
            .get_enrollment(actor.id(), course_id)
            .await?
            .is_none()
        {
            warn!(user_id = %actor.id(), quiz_id = %quiz_id, "attempt without enrollment");
            return Err(QuizServiceError::NotEnrolled);
        }

        if let Some(limit) = quiz.max_attempts() {
            let used = self.attempts.count_attempts(actor.id(), quiz_id).await?;
            if used >= limit {
                return Err(QuizServiceError::AttemptsExhausted { limit });
            }
        }

        let score = grade(&quiz, &answers)?;
        let points = points_for(&score);
        let record = NewAttemptRecord {
            user_id: actor.id(),
            quiz_id,
            score,
            answers,
            points_awarded: points,
            max_attempts: quiz.max_attempts(),
            submitted_at: self.clock.now(),
        };
        let recorded = match self.attempts.record_attempt(record).await {
            Ok(recorded) => recorded,
            Err(StorageError::Conflict) => {
                return Err(QuizServiceError::AttemptsExhausted {
                    limit: quiz.max_attempts().unwrap_or_default(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        info!(
            user_id = %actor.id(),
            quiz_id = %quiz_id,
            attempt = recorded.attempt.attempt_number,
            percentage = score.percentage,
            passed = score.passed,
            points,
            "quiz attempt recorded"
        );
        let badge_changed = recorded.badge_before != recorded.badge_after;
        if badge_changed {
            info!(
                user_id = %actor.id(),
                badge = recorded.badge_after.as_str(),
                total_points = recorded.total_points,
                "badge earned"
            );
        }

        let enrollment = self
            .progress
            .update_course_progress(actor.id(), course_id)
            .await?;

        Ok(AttemptOutcome {
            attempt: recorded.attempt,
            total_points: recorded.total_points,
            badge: recorded.badge_after,
            badge_changed,
            enrollment,
        })
    }

    /// A learner's attempts at one quiz, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Storage` if repository access fails.
    pub async fn list_attempts(
        &self,
        user: UserId,
        quiz_id: QuizId,
    ) -> Result<Vec<QuizAttempt>, QuizServiceError> {
        Ok(self.attempts.list_attempts(user, quiz_id).await?)
    }

    /// Highest-scoring attempt; the earliest wins a tie.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Storage` if repository access fails.
    pub async fn best_attempt(
        &self,
        user: UserId,
        quiz_id: QuizId,
    ) -> Result<Option<QuizAttempt>, QuizServiceError> {
        let attempts = self.attempts.list_attempts(user, quiz_id).await?;
        Ok(best_of(attempts))
    }

    async fn require_quiz(&self, id: QuizId) -> Result<Quiz, QuizServiceError> {
        self.quizzes
            .get_quiz(id)
            .await?
            .ok_or(QuizServiceError::NotFound)
    }

    async fn authorize(&self, actor: &User, course_id: CourseId) -> Result<(), QuizServiceError> {
        let course = self
            .courses
            .get_course(course_id)
            .await?
            .ok_or(QuizServiceError::CourseNotFound)?;
        if can_manage(actor, &course) {
            Ok(())
        } else {
            warn!(user_id = %actor.id(), course_id = %course_id, "quiz change rejected");
            Err(QuizServiceError::Forbidden)
        }
    }
}

fn best_of(attempts: Vec<QuizAttempt>) -> Option<QuizAttempt> {
    attempts.into_iter().reduce(|best, next| {
        if next.score.percentage > best.score.percentage {
            next
        } else {
            best
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lms_core::model::AttemptId;
    use lms_core::scoring::QuizScore;
    use lms_core::time::fixed_now;

    fn attempt(number: u32, correct: u32) -> QuizAttempt {
        QuizAttempt {
            id: AttemptId::new(u64::from(number)),
            user_id: UserId::new(1),
            quiz_id: QuizId::new(1),
            attempt_number: number,
            score: QuizScore::new(correct, 4, 60),
            answers: vec![],
            points_awarded: 0,
            submitted_at: fixed_now(),
        }
    }

    #[test]
    fn best_prefers_higher_score_then_earlier_attempt() {
        let best = best_of(vec![attempt(1, 2), attempt(2, 4), attempt(3, 4)]).unwrap();
        assert_eq!(best.attempt_number, 2);
        assert!(best_of(vec![]).is_none());
    }
}
