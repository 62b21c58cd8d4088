use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{CourseId, UserId};
use crate::model::media::{MediaUrl, MediaUrlError};

pub const MAX_TITLE_LEN: usize = 200;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CourseError {
    #[error("course title cannot be empty")]
    EmptyTitle,

    #[error("course title exceeds {MAX_TITLE_LEN} characters")]
    TitleTooLong,

    #[error("invalid thumbnail: {0}")]
    Thumbnail(#[source] MediaUrlError),

    #[error("unknown course level: {0}")]
    UnknownLevel(String),
}

//
// ─── LEVEL ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CourseLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl CourseLevel {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CourseLevel::Beginner => "beginner",
            CourseLevel::Intermediate => "intermediate",
            CourseLevel::Advanced => "advanced",
        }
    }

    /// # Errors
    ///
    /// Returns `CourseError::UnknownLevel` for values not produced by [`CourseLevel::as_str`].
    pub fn parse(value: &str) -> Result<Self, CourseError> {
        match value {
            "beginner" => Ok(CourseLevel::Beginner),
            "intermediate" => Ok(CourseLevel::Intermediate),
            "advanced" => Ok(CourseLevel::Advanced),
            other => Err(CourseError::UnknownLevel(other.to_owned())),
        }
    }
}

//
// ─── DETAILS ───────────────────────────────────────────────────────────────────
//

/// Unvalidated course fields as submitted by an instructor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseDraft {
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub level: CourseLevel,
    pub thumbnail_url: Option<String>,
}

impl CourseDraft {
    /// # Errors
    ///
    /// Returns `CourseError` when the title is blank or too long, or the thumbnail is invalid.
    pub fn validate(self) -> Result<CourseDetails, CourseError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(CourseError::EmptyTitle);
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(CourseError::TitleTooLong);
        }
        let thumbnail = MediaUrl::parse_optional(self.thumbnail_url.as_deref())
            .map_err(CourseError::Thumbnail)?;

        Ok(CourseDetails {
            title: title.to_owned(),
            description: non_blank(self.description),
            category: non_blank(self.category),
            level: self.level,
            thumbnail,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// Validated, editable part of a course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseDetails {
    title: String,
    description: Option<String>,
    category: Option<String>,
    level: CourseLevel,
    thumbnail: Option<MediaUrl>,
}

impl CourseDetails {
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    #[must_use]
    pub fn level(&self) -> CourseLevel {
        self.level
    }

    #[must_use]
    pub fn thumbnail(&self) -> Option<&MediaUrl> {
        self.thumbnail.as_ref()
    }
}

//
// ─── COURSE ────────────────────────────────────────────────────────────────────
//

/// A course authored by one instructor; only published courses accept enrollments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Course {
    id: CourseId,
    instructor_id: UserId,
    details: CourseDetails,
    published: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Course {
    /// A fresh, unpublished course.
    #[must_use]
    pub fn new(
        id: CourseId,
        instructor_id: UserId,
        details: CourseDetails,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            instructor_id,
            details,
            published: false,
            created_at,
            updated_at: created_at,
        }
    }

    #[must_use]
    pub fn from_persisted(
        id: CourseId,
        instructor_id: UserId,
        details: CourseDetails,
        published: bool,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            instructor_id,
            details,
            published,
            created_at,
            updated_at,
        }
    }

    #[must_use]
    pub fn id(&self) -> CourseId {
        self.id
    }

    #[must_use]
    pub fn instructor_id(&self) -> UserId {
        self.instructor_id
    }

    #[must_use]
    pub fn details(&self) -> &CourseDetails {
        &self.details
    }

    #[must_use]
    pub fn title(&self) -> &str {
        self.details.title()
    }

    #[must_use]
    pub fn is_published(&self) -> bool {
        self.published
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    #[must_use]
    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.instructor_id == user
    }

    pub fn replace_details(&mut self, details: CourseDetails, now: DateTime<Utc>) {
        self.details = details;
        self.updated_at = now;
    }

    pub fn set_published(&mut self, published: bool, now: DateTime<Utc>) {
        if self.published != published {
            self.published = published;
            self.updated_at = now;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use chrono::Duration;

    fn draft(title: &str) -> CourseDraft {
        CourseDraft {
            title: title.into(),
            ..CourseDraft::default()
        }
    }

    #[test]
    fn draft_trims_and_drops_blank_optionals() {
        let details = CourseDraft {
            title: "  Rust 101 ".into(),
            description: Some("   ".into()),
            category: Some(" programming ".into()),
            level: CourseLevel::Intermediate,
            thumbnail_url: Some(String::new()),
        }
        .validate()
        .unwrap();

        assert_eq!(details.title(), "Rust 101");
        assert_eq!(details.description(), None);
        assert_eq!(details.category(), Some("programming"));
        assert_eq!(details.level(), CourseLevel::Intermediate);
        assert!(details.thumbnail().is_none());
    }

    #[test]
    fn draft_rejects_blank_and_long_titles() {
        assert_eq!(draft("  ").validate().unwrap_err(), CourseError::EmptyTitle);
        let long = "x".repeat(MAX_TITLE_LEN + 1);
        assert_eq!(draft(&long).validate().unwrap_err(), CourseError::TitleTooLong);
    }

    #[test]
    fn draft_rejects_bad_thumbnail() {
        let err = CourseDraft {
            title: "Rust".into(),
            thumbnail_url: Some("ftp://example.com/a.png".into()),
            ..CourseDraft::default()
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, CourseError::Thumbnail(_)));
    }

    #[test]
    fn publishing_touches_updated_at_only_on_change() {
        let now = fixed_now();
        let mut course = Course::new(
            CourseId::new(1),
            UserId::new(2),
            draft("Rust").validate().unwrap(),
            now,
        );
        assert!(!course.is_published());

        let later = now + Duration::hours(1);
        course.set_published(true, later);
        assert!(course.is_published());
        assert_eq!(course.updated_at(), later);

        course.set_published(true, later + Duration::hours(1));
        assert_eq!(course.updated_at(), later);
    }

    #[test]
    fn level_parses_storage_names() {
        assert_eq!(CourseLevel::parse("advanced").unwrap(), CourseLevel::Advanced);
        assert!(CourseLevel::parse("expert").is_err());
    }
}
