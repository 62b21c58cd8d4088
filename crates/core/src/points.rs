//! Points awarded for quiz attempts and the badge ladder built on them.

use serde::{Deserialize, Serialize};

use crate::scoring::QuizScore;

pub const POINTS_PER_CORRECT_ANSWER: u32 = 10;
pub const PASS_BONUS: u32 = 20;

/// Badges in ascending order of their point threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Badge {
    Newcomer,
    Bronze,
    Silver,
    Gold,
    Platinum,
}

/// (threshold, badge), ascending. The first rung starts at zero.
pub const LADDER: [(u32, Badge); 5] = [
    (0, Badge::Newcomer),
    (100, Badge::Bronze),
    (300, Badge::Silver),
    (600, Badge::Gold),
    (1_000, Badge::Platinum),
];

impl Badge {
    /// Highest badge whose threshold is at or below `points`.
    #[must_use]
    pub fn for_points(points: u32) -> Self {
        LADDER
            .iter()
            .rev()
            .find(|(threshold, _)| points >= *threshold)
            .map_or(Badge::Newcomer, |(_, badge)| *badge)
    }

    #[must_use]
    pub fn threshold(self) -> u32 {
        LADDER
            .iter()
            .find(|(_, badge)| *badge == self)
            .map_or(0, |(threshold, _)| *threshold)
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Badge::Newcomer => "Newcomer",
            Badge::Bronze => "Bronze",
            Badge::Silver => "Silver",
            Badge::Gold => "Gold",
            Badge::Platinum => "Platinum",
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Badge::Newcomer => "newcomer",
            Badge::Bronze => "bronze",
            Badge::Silver => "silver",
            Badge::Gold => "gold",
            Badge::Platinum => "platinum",
        }
    }
}

/// The next rung above `points` and how many points are still missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NextBadge {
    pub badge: Badge,
    pub points_needed: u32,
}

#[must_use]
pub fn next_badge(points: u32) -> Option<NextBadge> {
    LADDER
        .iter()
        .find(|(threshold, _)| *threshold > points)
        .map(|(threshold, badge)| NextBadge {
            badge: *badge,
            points_needed: threshold - points,
        })
}

/// Points earned by one attempt: ten per correct answer, plus a bonus for passing.
#[must_use]
pub fn points_for(score: &QuizScore) -> u32 {
    let base = score.correct.saturating_mul(POINTS_PER_CORRECT_ANSWER);
    if score.passed {
        base.saturating_add(PASS_BONUS)
    } else {
        base
    }
}
