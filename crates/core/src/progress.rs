//! Course completion percentage.
//!
//! A course's work items are its lessons plus its quizzes. A learner has done
//! a lesson once it is marked completed and a quiz once they have submitted
//! at least one attempt, regardless of the score.

/// Raw counts for one (user, course) pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressCounts {
    pub total_lessons: u32,
    pub completed_lessons: u32,
    pub total_quizzes: u32,
    pub attempted_quizzes: u32,
}

impl ProgressCounts {
    #[must_use]
    pub fn total(&self) -> u32 {
        self.total_lessons.saturating_add(self.total_quizzes)
    }

    /// Done items, each kind capped at its total so stale rows cannot push past 100%.
    #[must_use]
    pub fn done(&self) -> u32 {
        self.completed_lessons
            .min(self.total_lessons)
            .saturating_add(self.attempted_quizzes.min(self.total_quizzes))
    }

    /// `round(100 * done / total)`, or 0 for a course with no lessons or quizzes.
    ///
    /// Only a fully finished course reports 100; 99.5% and up rounds down to 99.
    #[must_use]
    pub fn percent(&self) -> u8 {
        let total = u64::from(self.total());
        if total == 0 {
            return 0;
        }
        let done = u64::from(self.done());
        if done >= total {
            return 100;
        }
        let pct = (done * 200 + total) / (2 * total);
        u8::try_from(pct.min(99)).unwrap_or(99)
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.total() > 0 && self.done() >= self.total()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(tl: u32, cl: u32, tq: u32, aq: u32) -> ProgressCounts {
        ProgressCounts {
            total_lessons: tl,
            completed_lessons: cl,
            total_quizzes: tq,
            attempted_quizzes: aq,
        }
    }

    #[test]
    fn empty_course_is_zero() {
        assert_eq!(counts(0, 0, 0, 0).percent(), 0);
    }

    #[test]
    fn lessons_and_quizzes_weigh_equally() {
        assert_eq!(counts(3, 2, 1, 0).percent(), 50);
        assert_eq!(counts(3, 3, 1, 0).percent(), 75);
        assert_eq!(counts(3, 3, 1, 1).percent(), 100);
    }

    #[test]
    fn rounds_to_nearest() {
        assert_eq!(counts(3, 1, 0, 0).percent(), 33);
        assert_eq!(counts(3, 2, 0, 0).percent(), 67);
        assert_eq!(counts(199, 198, 1, 1).percent(), 99);
        assert_eq!(counts(200, 199, 1, 1).percent(), 99);
        assert_eq!(counts(201, 199, 0, 0).percent(), 99);
    }

    #[test]
    fn caps_stale_counts() {
        assert_eq!(counts(2, 5, 1, 3).percent(), 100);
        assert!(counts(2, 5, 1, 3).is_complete());
        assert!(!counts(0, 0, 0, 0).is_complete());
    }
}
