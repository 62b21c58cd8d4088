use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{CourseId, LessonId, QuizId};

pub const DEFAULT_PASSING_PERCENT: u8 = 60;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("quiz title cannot be empty")]
    EmptyTitle,

    #[error("quiz needs at least one question")]
    NoQuestions,

    #[error("question {index} has an empty prompt")]
    EmptyPrompt { index: usize },

    #[error("question {index} needs at least two options")]
    TooFewOptions { index: usize },

    #[error("question {index} has an empty option")]
    EmptyOption { index: usize },

    #[error("question {index} marks option {correct} as correct but has {options} options")]
    CorrectOptionOutOfRange {
        index: usize,
        correct: usize,
        options: usize,
    },

    #[error("passing percent must be between 0 and 100, got {0}")]
    InvalidPassingPercent(u8),

    #[error("max attempts must be greater than zero")]
    InvalidMaxAttempts,

    #[error("lesson does not belong to the quiz's course")]
    LessonOutsideCourse,
}

//
// ─── QUESTIONS ─────────────────────────────────────────────────────────────────
//

/// A single-choice question. Serialized as JSON in storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_option: usize,
}

impl QuizQuestion {
    fn validate(self, index: usize) -> Result<Self, QuizError> {
        let prompt = self.prompt.trim().to_owned();
        if prompt.is_empty() {
            return Err(QuizError::EmptyPrompt { index });
        }
        if self.options.len() < 2 {
            return Err(QuizError::TooFewOptions { index });
        }
        let options: Vec<String> = self.options.iter().map(|o| o.trim().to_owned()).collect();
        if options.iter().any(String::is_empty) {
            return Err(QuizError::EmptyOption { index });
        }
        if self.correct_option >= options.len() {
            return Err(QuizError::CorrectOptionOutOfRange {
                index,
                correct: self.correct_option,
                options: options.len(),
            });
        }
        Ok(Self {
            prompt,
            options,
            correct_option: self.correct_option,
        })
    }
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizDraft {
    pub title: String,
    pub lesson_id: Option<LessonId>,
    pub questions: Vec<QuizQuestion>,
    pub passing_percent: u8,
    pub max_attempts: Option<u32>,
}

impl QuizDraft {
    /// Validates the draft for `course_id`.
    ///
    /// `course_lessons` are the lesson ids of that course, used to check `lesson_id`.
    ///
    /// # Errors
    ///
    /// Returns the first `QuizError` found.
    pub fn validate(
        self,
        id: QuizId,
        course_id: CourseId,
        course_lessons: &[LessonId],
        created_at: DateTime<Utc>,
    ) -> Result<Quiz, QuizError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(QuizError::EmptyTitle);
        }
        if self.questions.is_empty() {
            return Err(QuizError::NoQuestions);
        }
        if self.passing_percent > 100 {
            return Err(QuizError::InvalidPassingPercent(self.passing_percent));
        }
        if self.max_attempts == Some(0) {
            return Err(QuizError::InvalidMaxAttempts);
        }
        if self
            .lesson_id
            .is_some_and(|lesson| !course_lessons.contains(&lesson))
        {
            return Err(QuizError::LessonOutsideCourse);
        }
        let questions = self
            .questions
            .into_iter()
            .enumerate()
            .map(|(index, q)| q.validate(index))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Quiz {
            id,
            course_id,
            lesson_id: self.lesson_id,
            title: title.to_owned(),
            questions,
            passing_percent: self.passing_percent,
            max_attempts: self.max_attempts,
            created_at,
        })
    }
}

//
// ─── QUIZ ──────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quiz {
    id: QuizId,
    course_id: CourseId,
    lesson_id: Option<LessonId>,
    title: String,
    questions: Vec<QuizQuestion>,
    passing_percent: u8,
    max_attempts: Option<u32>,
    created_at: DateTime<Utc>,
}

impl Quiz {
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn from_persisted(
        id: QuizId,
        course_id: CourseId,
        lesson_id: Option<LessonId>,
        title: String,
        questions: Vec<QuizQuestion>,
        passing_percent: u8,
        max_attempts: Option<u32>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            course_id,
            lesson_id,
            title,
            questions,
            passing_percent,
            max_attempts,
            created_at,
        }
    }

    /// Same quiz under the id assigned by storage.
    #[must_use]
    pub fn with_id(mut self, id: QuizId) -> Self {
        self.id = id;
        self
    }

    #[must_use]
    pub fn id(&self) -> QuizId {
        self.id
    }

    #[must_use]
    pub fn course_id(&self) -> CourseId {
        self.course_id
    }

    #[must_use]
    pub fn lesson_id(&self) -> Option<LessonId> {
        self.lesson_id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }

    #[must_use]
    pub fn passing_percent(&self) -> u8 {
        self.passing_percent
    }

    #[must_use]
    pub fn max_attempts(&self) -> Option<u32> {
        self.max_attempts
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn question(options: &[&str], correct: usize) -> QuizQuestion {
        QuizQuestion {
            prompt: "What does `&mut` grant?".into(),
            options: options.iter().map(|s| (*s).to_owned()).collect(),
            correct_option: correct,
        }
    }

    fn draft(questions: Vec<QuizQuestion>) -> QuizDraft {
        QuizDraft {
            title: "Borrowing".into(),
            lesson_id: None,
            questions,
            passing_percent: DEFAULT_PASSING_PERCENT,
            max_attempts: None,
        }
    }

    fn validate(d: QuizDraft) -> Result<Quiz, QuizError> {
        d.validate(QuizId::new(1), CourseId::new(1), &[LessonId::new(5)], fixed_now())
    }

    #[test]
    fn valid_quiz_trims_text() {
        let quiz = validate(draft(vec![question(&[" shared ", "exclusive"], 1)])).unwrap();
        assert_eq!(quiz.questions()[0].options[0], "shared");
        assert_eq!(quiz.passing_percent(), 60);
    }

    #[test]
    fn rejects_structural_problems() {
        assert_eq!(validate(draft(vec![])).unwrap_err(), QuizError::NoQuestions);
        assert_eq!(
            validate(draft(vec![question(&["only"], 0)])).unwrap_err(),
            QuizError::TooFewOptions { index: 0 }
        );
        assert_eq!(
            validate(draft(vec![question(&["a", "b"], 0), question(&["a", " "], 0)])).unwrap_err(),
            QuizError::EmptyOption { index: 1 }
        );
        assert_eq!(
            validate(draft(vec![question(&["a", "b"], 2)])).unwrap_err(),
            QuizError::CorrectOptionOutOfRange {
                index: 0,
                correct: 2,
                options: 2
            }
        );
    }

    #[test]
    fn rejects_bad_settings() {
        let mut d = draft(vec![question(&["a", "b"], 0)]);
        d.passing_percent = 101;
        assert_eq!(validate(d).unwrap_err(), QuizError::InvalidPassingPercent(101));

        let mut d = draft(vec![question(&["a", "b"], 0)]);
        d.max_attempts = Some(0);
        assert_eq!(validate(d).unwrap_err(), QuizError::InvalidMaxAttempts);
    }

    #[test]
    fn lesson_must_belong_to_course() {
        let mut d = draft(vec![question(&["a", "b"], 0)]);
        d.lesson_id = Some(LessonId::new(6));
        assert_eq!(validate(d).unwrap_err(), QuizError::LessonOutsideCourse);

        let mut d = draft(vec![question(&["a", "b"], 0)]);
        d.lesson_id = Some(LessonId::new(5));
        assert_eq!(validate(d).unwrap().lesson_id(), Some(LessonId::new(5)));
    }
}
