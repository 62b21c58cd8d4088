//! Grading of quiz submissions.

use thiserror::Error;

use crate::model::Quiz;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SubmissionError {
    #[error("expected {expected} answers, got {got}")]
    AnswerCountMismatch { expected: usize, got: usize },

    #[error("question {question} has no option {option}")]
    OptionOutOfRange { question: usize, option: usize },
}

/// Outcome of grading one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizScore {
    pub correct: u32,
    pub total: u32,
    /// `round(correct * 100 / total)`.
    pub percentage: u8,
    pub passed: bool,
}

impl QuizScore {
    /// Rebuilds a score from stored columns, recomputing the percentage.
    #[must_use]
    pub fn new(correct: u32, total: u32, passing_percent: u8) -> Self {
        let percentage = percentage(correct, total);
        Self {
            correct,
            total,
            percentage,
            passed: percentage >= passing_percent,
        }
    }
}

fn percentage(correct: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = (u64::from(correct.min(total)) * 200 + u64::from(total)) / (2 * u64::from(total));
    u8::try_from(pct.min(100)).unwrap_or(100)
}

/// Grades `answers` (one entry per question, `None` = skipped) against `quiz`.
///
/// # Errors
///
/// Returns `SubmissionError` if the answer count differs from the question
/// count or an answer names an option the question does not have.
pub fn grade(quiz: &Quiz, answers: &[Option<usize>]) -> Result<QuizScore, SubmissionError> {
    let questions = quiz.questions();
    if answers.len() != questions.len() {
        return Err(SubmissionError::AnswerCountMismatch {
            expected: questions.len(),
            got: answers.len(),
        });
    }

    let mut correct = 0_u32;
    for (index, (question, answer)) in questions.iter().zip(answers).enumerate() {
        let Some(option) = *answer else { continue };
        if option >= question.options.len() {
            return Err(SubmissionError::OptionOutOfRange {
                question: index,
                option,
            });
        }
        if option == question.correct_option {
            correct += 1;
        }
    }

    let total = u32::try_from(questions.len()).unwrap_or(u32::MAX);
    Ok(QuizScore::new(correct, total, quiz.passing_percent()))
}
