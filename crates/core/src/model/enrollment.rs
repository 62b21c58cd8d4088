use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{CourseId, LessonId, UserId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EnrollmentError {
    #[error("unknown enrollment status: {0}")]
    UnknownStatus(String),

    #[error("progress percent must be between 0 and 100, got {0}")]
    InvalidPercent(u8),

    #[error("time spent must be at most 86400 seconds per update, got {0}")]
    TimeOutOfRange(u64),
}

//
// ─── STATUS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnrollmentStatus {
    Active,
    Completed,
}

impl EnrollmentStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            EnrollmentStatus::Active => "active",
            EnrollmentStatus::Completed => "completed",
        }
    }

    /// # Errors
    ///
    /// Returns `EnrollmentError::UnknownStatus` for unrecognized values.
    pub fn parse(value: &str) -> Result<Self, EnrollmentError> {
        match value {
            "active" => Ok(EnrollmentStatus::Active),
            "completed" => Ok(EnrollmentStatus::Completed),
            other => Err(EnrollmentError::UnknownStatus(other.to_owned())),
        }
    }
}

//
// ─── ENROLLMENT ────────────────────────────────────────────────────────────────
//

/// Join record between a learner and a course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enrollment {
    user_id: UserId,
    course_id: CourseId,
    status: EnrollmentStatus,
    progress_percent: u8,
    enrolled_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl Enrollment {
    #[must_use]
    pub fn new(user_id: UserId, course_id: CourseId, enrolled_at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            course_id,
            status: EnrollmentStatus::Active,
            progress_percent: 0,
            enrolled_at,
            completed_at: None,
        }
    }

    /// # Errors
    ///
    /// Returns `EnrollmentError::InvalidPercent` if the stored percent exceeds 100.
    pub fn from_persisted(
        user_id: UserId,
        course_id: CourseId,
        status: EnrollmentStatus,
        progress_percent: u8,
        enrolled_at: DateTime<Utc>,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<Self, EnrollmentError> {
        if progress_percent > 100 {
            return Err(EnrollmentError::InvalidPercent(progress_percent));
        }
        Ok(Self {
            user_id,
            course_id,
            status,
            progress_percent,
            enrolled_at,
            completed_at,
        })
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn course_id(&self) -> CourseId {
        self.course_id
    }

    #[must_use]
    pub fn status(&self) -> EnrollmentStatus {
        self.status
    }

    #[must_use]
    pub fn progress_percent(&self) -> u8 {
        self.progress_percent
    }

    #[must_use]
    pub fn enrolled_at(&self) -> DateTime<Utc> {
        self.enrolled_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == EnrollmentStatus::Completed
    }

    /// Stores a recomputed percentage and derives the status from it.
    ///
    /// 100 marks the enrollment completed; the first completion time is kept
    /// while it stays at 100. Anything lower reopens it.
    ///
    /// # Errors
    ///
    /// Returns `EnrollmentError::InvalidPercent` if `percent > 100`.
    pub fn apply_progress(&mut self, percent: u8, now: DateTime<Utc>) -> Result<(), EnrollmentError> {
        if percent > 100 {
            return Err(EnrollmentError::InvalidPercent(percent));
        }
        self.progress_percent = percent;
        if percent == 100 {
            if self.status != EnrollmentStatus::Completed {
                self.status = EnrollmentStatus::Completed;
                self.completed_at = Some(now);
            }
        } else {
            self.status = EnrollmentStatus::Active;
            self.completed_at = None;
        }
        Ok(())
    }
}

//
// ─── LESSON PROGRESS ───────────────────────────────────────────────────────────
//

/// Per-user, per-lesson completion and time spent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonProgress {
    pub user_id: UserId,
    pub lesson_id: LessonId,
    pub completed: bool,
    pub time_spent_secs: u64,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// Upper bound on the seconds one request may add to a lesson.
pub const MAX_SECS_PER_UPDATE: u64 = 24 * 60 * 60;

/// A delta reported against a lesson: extra viewing time, and whether the
/// lesson is now complete. Storage folds it into the existing row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressUpdate {
    user_id: UserId,
    lesson_id: LessonId,
    added_secs: u64,
    completes: bool,
    at: DateTime<Utc>,
}

impl ProgressUpdate {
    /// # Errors
    ///
    /// Returns `EnrollmentError::TimeOutOfRange` above `MAX_SECS_PER_UPDATE`.
    pub fn new(
        user_id: UserId,
        lesson_id: LessonId,
        added_secs: u64,
        completes: bool,
        at: DateTime<Utc>,
    ) -> Result<Self, EnrollmentError> {
        if added_secs > MAX_SECS_PER_UPDATE {
            return Err(EnrollmentError::TimeOutOfRange(added_secs));
        }
        Ok(Self {
            user_id,
            lesson_id,
            added_secs,
            completes,
            at,
        })
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn lesson_id(&self) -> LessonId {
        self.lesson_id
    }

    #[must_use]
    pub fn added_secs(&self) -> u64 {
        self.added_secs
    }

    #[must_use]
    pub fn completes(&self) -> bool {
        self.completes
    }

    #[must_use]
    pub fn at(&self) -> DateTime<Utc> {
        self.at
    }

    /// Completion time to store when this update creates or finishes the row.
    /// An earlier completion time always wins.
    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completes.then_some(self.at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use chrono::Duration;

    fn enrollment() -> Enrollment {
        Enrollment::new(UserId::new(1), CourseId::new(2), fixed_now())
    }

    #[test]
    fn reaching_100_completes_once() {
        let mut e = enrollment();
        let t1 = fixed_now() + Duration::days(1);
        e.apply_progress(100, t1).unwrap();
        assert!(e.is_completed());
        assert_eq!(e.completed_at(), Some(t1));

        e.apply_progress(100, t1 + Duration::days(1)).unwrap();
        assert_eq!(e.completed_at(), Some(t1));
    }

    #[test]
    fn dropping_below_100_reopens() {
        let mut e = enrollment();
        e.apply_progress(100, fixed_now()).unwrap();
        e.apply_progress(80, fixed_now()).unwrap();
        assert_eq!(e.status(), EnrollmentStatus::Active);
        assert_eq!(e.completed_at(), None);
        assert_eq!(e.progress_percent(), 80);
    }

    #[test]
    fn rejects_percent_over_100() {
        let mut e = enrollment();
        assert_eq!(
            e.apply_progress(101, fixed_now()).unwrap_err(),
            EnrollmentError::InvalidPercent(101)
        );
    }

    #[test]
    fn progress_update_bounds_time() {
        let update =
            ProgressUpdate::new(UserId::new(1), LessonId::new(1), 30, true, fixed_now()).unwrap();
        assert_eq!(update.added_secs(), 30);
        assert_eq!(update.completed_at(), Some(fixed_now()));

        let viewing = ProgressUpdate::new(
            UserId::new(1),
            LessonId::new(1),
            MAX_SECS_PER_UPDATE,
            false,
            fixed_now(),
        )
        .unwrap();
        assert_eq!(viewing.completed_at(), None);

        assert_eq!(
            ProgressUpdate::new(UserId::new(1), LessonId::new(1), u64::MAX, false, fixed_now())
                .unwrap_err(),
            EnrollmentError::TimeOutOfRange(u64::MAX)
        );
    }
}
