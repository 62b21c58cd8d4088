use chrono::{DateTime, Utc};

use crate::model::ids::{AttemptId, QuizId, UserId};
use crate::scoring::QuizScore;

/// One scored submission, numbered from 1 per (user, quiz).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizAttempt {
    pub id: AttemptId,
    pub user_id: UserId,
    pub quiz_id: QuizId,
    pub attempt_number: u32,
    pub score: QuizScore,
    pub answers: Vec<Option<usize>>,
    pub points_awarded: u32,
    pub submitted_at: DateTime<Utc>,
}

/// Entry in a user's points ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointEvent {
    pub user_id: UserId,
    pub amount: u32,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}
