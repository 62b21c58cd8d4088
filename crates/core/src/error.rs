use thiserror::Error;

use crate::model::{
    CourseError, EnrollmentError, LessonError, QuizError, ReviewError, UserError,
};
use crate::scoring::SubmissionError;

/// Any validation failure raised by the domain layer.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    User(#[from] UserError),
    #[error(transparent)]
    Course(#[from] CourseError),
    #[error(transparent)]
    Lesson(#[from] LessonError),
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Submission(#[from] SubmissionError),
    #[error(transparent)]
    Enrollment(#[from] EnrollmentError),
    #[error(transparent)]
    Review(#[from] ReviewError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_convert_transparently() {
        let err: Error = ReviewError::CommentTooLong.into();
        assert!(matches!(err, Error::Review(ReviewError::CommentTooLong)));
        assert_eq!(err.to_string(), ReviewError::CommentTooLong.to_string());
    }
}
