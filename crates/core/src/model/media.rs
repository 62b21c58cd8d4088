use thiserror::Error;
use url::Url;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MediaUrlError {
    #[error("media URL cannot be empty")]
    Empty,

    #[error("media URL is not a valid absolute URL: {0}")]
    Malformed(String),

    #[error("media URL must use http or https, got {0}")]
    UnsupportedScheme(String),
}

//
// ─── MEDIA URL ─────────────────────────────────────────────────────────────────
//

/// Absolute http(s) link to a hosted thumbnail or lesson video.
///
/// Uploading is handled elsewhere; the backend only stores the link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaUrl(Url);

impl MediaUrl {
    /// Parses and validates a hosted media link.
    ///
    /// # Errors
    ///
    /// Returns `MediaUrlError` when the input is blank, unparsable, or not http(s).
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, MediaUrlError> {
        let s = raw.as_ref().trim();
        if s.is_empty() {
            return Err(MediaUrlError::Empty);
        }
        let url = Url::parse(s).map_err(|_| MediaUrlError::Malformed(s.to_owned()))?;
        match url.scheme() {
            "http" | "https" => Ok(Self(url)),
            other => Err(MediaUrlError::UnsupportedScheme(other.to_owned())),
        }
    }

    /// Treats a blank value as "no media".
    ///
    /// # Errors
    ///
    /// Returns `MediaUrlError` for non-blank values that fail [`MediaUrl::parse`].
    pub fn parse_optional(raw: Option<&str>) -> Result<Option<Self>, MediaUrlError> {
        match raw.map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => Self::parse(s).map(Some),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for MediaUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_https_links() {
        let url = MediaUrl::parse(" https://cdn.example.com/intro.mp4 ").unwrap();
        assert_eq!(url.as_str(), "https://cdn.example.com/intro.mp4");
    }

    #[test]
    fn rejects_relative_and_foreign_schemes() {
        assert!(matches!(
            MediaUrl::parse("uploads/intro.mp4"),
            Err(MediaUrlError::Malformed(_))
        ));
        assert_eq!(
            MediaUrl::parse("file:///tmp/a.png").unwrap_err(),
            MediaUrlError::UnsupportedScheme("file".into())
        );
    }

    #[test]
    fn blank_optional_is_none() {
        assert_eq!(MediaUrl::parse_optional(Some("   ")).unwrap(), None);
        assert_eq!(MediaUrl::parse_optional(None).unwrap(), None);
    }
}
