mod attempt;
mod course;
mod enrollment;
mod ids;
mod lesson;
mod media;
mod quiz;
mod review;
mod user;

pub use ids::{AttemptId, CourseId, LessonId, ParseIdError, QuizId, ReviewId, UserId};
pub use media::{MediaUrl, MediaUrlError};

pub use attempt::{PointEvent, QuizAttempt};
pub use course::{Course, CourseDetails, CourseDraft, CourseError, CourseLevel, MAX_TITLE_LEN};
pub use enrollment::{
    Enrollment, EnrollmentError, EnrollmentStatus, LessonProgress, MAX_SECS_PER_UPDATE,
    ProgressUpdate,
};
pub use lesson::{Lesson, LessonDetails, LessonDraft, LessonError, validate_order};
pub use quiz::{DEFAULT_PASSING_PERCENT, Quiz, QuizDraft, QuizError, QuizQuestion};
pub use review::{
    CourseReview, MAX_COMMENT_LEN, Rating, RatingSummary, ReviewError, normalize_comment,
};
pub use user::{NewUser, Role, User, UserError};
