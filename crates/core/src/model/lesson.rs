use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::{CourseId, LessonId};
use crate::model::media::{MediaUrl, MediaUrlError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LessonError {
    #[error("lesson title cannot be empty")]
    EmptyTitle,

    #[error("invalid video link: {0}")]
    Video(#[source] MediaUrlError),

    #[error("lesson order must list every lesson of the course exactly once")]
    InvalidOrder,
}

/// Unvalidated lesson input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LessonDraft {
    pub title: String,
    pub content: String,
    pub video_url: Option<String>,
    pub duration_minutes: u32,
}

impl LessonDraft {
    /// # Errors
    ///
    /// Returns `LessonError::EmptyTitle` or `LessonError::Video`.
    pub fn validate(self) -> Result<LessonDetails, LessonError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(LessonError::EmptyTitle);
        }
        let video = MediaUrl::parse_optional(self.video_url.as_deref()).map_err(LessonError::Video)?;
        Ok(LessonDetails {
            title: title.to_owned(),
            content: self.content,
            video,
            duration_minutes: self.duration_minutes,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonDetails {
    title: String,
    content: String,
    video: Option<MediaUrl>,
    duration_minutes: u32,
}

impl LessonDetails {
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Lesson body; markdown is rendered by the clients.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    #[must_use]
    pub fn video(&self) -> Option<&MediaUrl> {
        self.video.as_ref()
    }

    #[must_use]
    pub fn duration_minutes(&self) -> u32 {
        self.duration_minutes
    }
}

/// One unit of course material, ordered by `position` within its course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lesson {
    id: LessonId,
    course_id: CourseId,
    details: LessonDetails,
    position: u32,
    created_at: DateTime<Utc>,
}

impl Lesson {
    #[must_use]
    pub fn from_persisted(
        id: LessonId,
        course_id: CourseId,
        details: LessonDetails,
        position: u32,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            course_id,
            details,
            position,
            created_at,
        }
    }

    #[must_use]
    pub fn id(&self) -> LessonId {
        self.id
    }

    #[must_use]
    pub fn course_id(&self) -> CourseId {
        self.course_id
    }

    #[must_use]
    pub fn details(&self) -> &LessonDetails {
        &self.details
    }

    #[must_use]
    pub fn position(&self) -> u32 {
        self.position
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn replace_details(&mut self, details: LessonDetails) {
        self.details = details;
    }
}

/// Checks that `requested` is a permutation of `existing`.
///
/// # Errors
///
/// Returns `LessonError::InvalidOrder` on missing, extra, or duplicate ids.
pub fn validate_order(existing: &[LessonId], requested: &[LessonId]) -> Result<(), LessonError> {
    if existing.len() != requested.len() {
        return Err(LessonError::InvalidOrder);
    }
    let mut a = existing.to_vec();
    let mut b = requested.to_vec();
    a.sort_unstable();
    b.sort_unstable();
    if a == b {
        Ok(())
    } else {
        Err(LessonError::InvalidOrder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_requires_title() {
        let err = LessonDraft {
            title: " ".into(),
            ..LessonDraft::default()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err, LessonError::EmptyTitle);
    }

    #[test]
    fn draft_keeps_content_verbatim() {
        let details = LessonDraft {
            title: "Ownership".into(),
            content: "  # Ownership\n".into(),
            video_url: Some("https://videos.example.com/1".into()),
            duration_minutes: 12,
        }
        .validate()
        .unwrap();
        assert_eq!(details.content(), "  # Ownership\n");
        assert_eq!(details.video().unwrap().as_str(), "https://videos.example.com/1");
        assert_eq!(details.duration_minutes(), 12);
    }

    #[test]
    fn order_must_be_a_permutation() {
        let ids = [LessonId::new(1), LessonId::new(2), LessonId::new(3)];
        assert!(validate_order(&ids, &[ids[2], ids[0], ids[1]]).is_ok());
        assert!(validate_order(&ids, &[ids[0], ids[1]]).is_err());
        assert!(validate_order(&ids, &[ids[0], ids[0], ids[1]]).is_err());
        assert!(validate_order(&ids, &[ids[0], ids[1], LessonId::new(9)]).is_err());
    }
}
